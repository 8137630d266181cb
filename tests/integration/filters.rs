//! Filter chains inside resolved documents.

use serde_json::json;
use stitch_cli::core::Result;
use stitch_cli::expression::{Map, Value};
use stitch_cli::filters::FilterRegistry;
use stitch_cli::test_utils::{SiteFixture, data};

async fn render(template: &str, json: serde_json::Value) -> String {
    let site = SiteFixture::new().page("page.txt", template);
    site.resolver().resolve_path("page.txt", data(json)).await.unwrap()
}

fn pirate_filters() -> FilterRegistry {
    let mut filters = FilterRegistry::new();
    filters
        .register("shout", |input: Value, _args: Vec<Value>| -> Result<Value> {
            Ok(Value::from(input.to_text().to_uppercase()))
        })
        .register("piratify", |input: Value, args: Vec<Value>| -> Result<Value> {
            let prefix = args.first().map_or("Yo-ho-ho".to_string(), Value::to_text);
            let suffix = args.get(1).map_or("yarrr".to_string(), Value::to_text);
            Ok(Value::from(format!("{prefix}! {}, {suffix}!", input.to_text())))
        });
    filters
}

#[tokio::test]
async fn test_caller_filters_with_arguments_and_order() {
    let site = SiteFixture::new().page(
        "page.txt",
        "{{ greeting | piratify }}\n{{ greeting | piratify: \"AYE\" }}\n{{ greeting | piratify: \"Ahoy\", \"matey\" | shout }}\n{{ greeting | shout | piratify }}",
    );
    let resolver = site.resolver().with_filters(&pirate_filters());
    let out = resolver
        .resolve_path("page.txt", data(json!({"greeting": "Hello Lea"})))
        .await
        .unwrap();
    assert_eq!(
        out,
        "Yo-ho-ho! Hello Lea, yarrr!\nAYE! Hello Lea, yarrr!\nAHOY! HELLO LEA, MATEY!\nYo-ho-ho! HELLO LEA, yarrr!"
    );
}

#[tokio::test]
async fn test_filter_arguments_reference_data() {
    let out = render("{{ meta.authors | limit: meta.count }}", json!({"meta": {"authors": ["Joe", "Lea", "Max"], "count": 2}})).await;
    assert_eq!(out, "Joe,Lea");
}

#[tokio::test]
async fn test_unknown_filter_is_local() {
    let out = render("a {{ x | frobnicate }} b {{ x }}", json!({"x": 1})).await;
    assert!(out.starts_with("a <template-error>Error: unregistered or invalid filter: frobnicate"), "{out}");
    assert!(out.ends_with("</template-error> b 1"), "{out}");
}

#[tokio::test]
async fn test_formatting_filters() {
    let out = render(
        "{{ price | currency }}|{{ price | currency: \"en-US\", \"usd\" }}|{{ when | date: \"en-US\" }}|{{ big | numberFormat: \"en-US\" }}",
        json!({"price": 1234.5, "when": "2024-03-12T10:30:00Z", "big": 1234567}),
    )
    .await;
    assert_eq!(out, "1.234,50\u{a0}€|$1,234.50|Mar 12, 2024|1,234,567");
}

#[tokio::test]
async fn test_collection_filters() {
    let out = render(
        "{{ xs | sort | json }} {{ xs | reverse | json }} {{ xs | last: 2 | json }}",
        json!({"xs": ["b", "c", "a"]}),
    )
    .await;
    assert_eq!(out, r#"["a","b","c"] ["a","c","b"] ["a","c"]"#);
}

#[tokio::test]
async fn test_escaping_filters() {
    let out = render(
        "{{ html | htmlentities }} {{ q | urlencode }} {{ html }}",
        json!({"html": "<a & b>", "q": "a b&c/d"}),
    )
    .await;
    assert_eq!(out, "&lt;a &amp; b&gt; a%20b%26c%2Fd &lt;a &amp; b&gt;");
}

#[tokio::test]
async fn test_pipe_and_async() {
    let site = SiteFixture::new().page("page.txt", "{{ answer | async }} {{ 2 | pipe: n => n * 21 }}");
    let mut data = Map::new();
    data.insert(
        "answer".to_string(),
        Value::function("answer", |_| Ok(Value::pending(async { Ok(Value::from(42i64)) }))),
    );
    let out = site.resolver().resolve_path("page.txt", data).await.unwrap();
    assert_eq!(out, "42 42");
}
