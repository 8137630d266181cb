//! Helper functions available in every placeholder scope.
//!
//! Helpers sit behind the document data in the scope chain, so a data key with
//! the same name shadows a helper.
//!
//! - `fetchJson(url, options?)` fetches a URL and parses the body as JSON.
//! - `fetchText(url, options?)` fetches a URL and returns the body as text.
//!
//! Both return pending values. `options` may carry `method`, `headers` (an
//! object of header names to values) and `body`. A failed request or a
//! non-success status rejects the pending value, which renders as an inline
//! error marker.

use std::sync::OnceLock;

use reqwest::Method;
use tracing::debug;

use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum BodyKind {
    Json,
    Text,
}

/// The helper functions injected into every render scope.
pub fn builtin() -> Map {
    let mut helpers = Map::new();
    helpers.insert("fetchJson".to_string(), fetch_helper("fetchJson", BodyKind::Json));
    helpers.insert("fetchText".to_string(), fetch_helper("fetchText", BodyKind::Text));
    helpers
}

fn client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

fn fetch_helper(name: &'static str, kind: BodyKind) -> Value {
    Value::function(name, move |args| {
        let request = FetchRequest::from_args(name, &args)?;
        Ok(Value::pending(request.send(kind)))
    })
}

#[derive(Debug)]
struct FetchRequest {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl FetchRequest {
    fn from_args(helper: &str, args: &[Value]) -> Result<Self> {
        let url = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| TemplateError::expression(format!("{helper} expects a URL")))?
            .to_string();

        let options = args.get(1).and_then(Value::as_object);
        let method = match options.and_then(|o| o.get("method")).and_then(Value::as_str) {
            Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| TemplateError::expression(format!("invalid HTTP method '{method}'")))?,
            None => Method::GET,
        };
        let headers = options
            .and_then(|o| o.get("headers"))
            .and_then(Value::as_object)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.to_text())).collect())
            .unwrap_or_default();
        let body = options
            .and_then(|o| o.get("body"))
            .filter(|b| !b.is_nullish())
            .map(Value::to_text);

        Ok(Self {
            url,
            method,
            headers,
            body,
        })
    }

    async fn send(self, kind: BodyKind) -> Result<Value> {
        debug!("Fetching {} {}", self.method, self.url);
        let url = self.url;
        let failed = |e: reqwest::Error| {
            TemplateError::expression(format!("failed to fetch '{url}': {e}"))
        };

        let mut request = client().request(self.method, &url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TemplateError::expression(format!(
                "failed to fetch '{url}': HTTP {status}"
            )));
        }
        match kind {
            BodyKind::Json => {
                response.json::<serde_json::Value>().await.map(Value::from).map_err(failed)
            }
            BodyKind::Text => response.text().await.map(Value::from).map_err(failed),
        }
    }
}
