//! Resolution of document graphs held in memory.

use serde_json::json;
use stitch_cli::expression::{Map, Value};
use stitch_cli::test_utils::{SiteFixture, data, init_test_logging};

use crate::CYCLIC_MARKER;

fn front(body: &str, entries: &[(&str, &str)]) -> String {
    let lines: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("---\n{}\n---\n{body}", lines.join("\n"))
}

#[tokio::test]
async fn test_include_with_data() {
    init_test_logging(None);

    let site = SiteFixture::new()
        .page("index.html", "<h1>{{ title }}</h1>\n{{ include(\"article.html\", {text: \"muh\"}) | safe }}")
        .include("article.html", "<article>{{ text }}</article>");

    let out = site.resolver().resolve_path("index.html", data(json!({"title": "test"}))).await.unwrap();
    assert_eq!(out, "<h1>test</h1>\n<article>muh</article>");
}

#[tokio::test]
async fn test_waterfall_includes() {
    let site = SiteFixture::new()
        .page("index.html", "<h1>{{ title }}</h1>\n{{ include(\"wrapper.html\") | safe }}")
        .include("wrapper.html", "<div>{{ include(\"article.html\", {text: \"muh\"}) | safe }}</div>")
        .include("article.html", "<article>{{ text }} by {{ title }}</article>");

    let out = site.resolver().resolve_path("index.html", data(json!({"title": "test"}))).await.unwrap();
    assert_eq!(out, "<h1>test</h1>\n<div><article>muh by test</article></div>");
}

#[tokio::test]
async fn test_include_cycle_back_to_page() {
    let site = SiteFixture::new()
        .page("index.html", "<h1>{{ title }}</h1>\n{{ include(\"wrapper.html\") | safe }}")
        .include("wrapper.html", "<div>{{ include(\"article.html\", {text: \"muh\"}) | safe }}</div>")
        .include("article.html", "<article>{{ include(\"/index.html\") | safe }}</article>");

    let out = site.resolver().resolve_path("index.html", data(json!({"title": "test"}))).await.unwrap();
    assert_eq!(out, format!("<h1>test</h1>\n<div><article>{CYCLIC_MARKER}</article></div>"));
}

#[tokio::test]
async fn test_cycle_does_not_poison_siblings() {
    let site = SiteFixture::new()
        .page("index.html", "{{ include(\"a.html\") | safe }}|{{ include(\"b.html\") | safe }}")
        .include("a.html", "a({{ include(\"a.html\") | safe }})")
        .include("b.html", "b({{ include(\"c.html\") | safe }})")
        .include("c.html", "c");

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, format!("a({CYCLIC_MARKER})|b(c)"));
}

#[tokio::test]
async fn test_frontmatter_takes_precedence() {
    let site = SiteFixture::new().page("index.html", &front("<h1>{{ title }}</h1>", &[("title", "\"Hello\"")]));

    let out = site.resolver().resolve_path("index.html", data(json!({"title": "Untitled"}))).await.unwrap();
    assert_eq!(out, "<h1>Hello</h1>");
}

#[tokio::test]
async fn test_layout_with_extension() {
    let site = SiteFixture::new()
        .page("index.html", &front("<h1>{{ title }}</h1>", &[("title", "\"Hello\""), ("layout", "\"article.html\"")]))
        .layout("article.html", "<article>{{ content | safe }}</article>");

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, "<article><h1>Hello</h1></article>");
}

#[tokio::test]
async fn test_nested_layouts() {
    let site = SiteFixture::new()
        .page("index.html", &front("<h1>{{ title }}</h1>", &[("title", "\"Hello\""), ("layout", "\"article\"")]))
        .layout("article.html", &front("<article>{{ content | safe }}</article>", &[("layout", "\"base\"")]))
        .layout("base.html", "<body>{{ content | safe }}</body>");

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, "<body><article><h1>Hello</h1></article></body>");
}

#[tokio::test]
async fn test_layout_cycle_is_whole_document() {
    let site = SiteFixture::new()
        .page("index.html", &front("<h1>{{ title }}</h1>", &[("title", "\"Hello\""), ("layout", "\"article\"")]))
        .layout("article.html", &front("<article>{{ content | safe }}</article>", &[("layout", "\"base\"")]))
        .layout("base.html", &front("<body>{{ content | safe }}</body>", &[("layout", "\"article\"")]));

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, CYCLIC_MARKER);
}

#[tokio::test]
async fn test_layout_cycle_inside_include_stays_local() {
    let site = SiteFixture::new()
        .page("index.html", "<main>{{ include(\"card.html\") | safe }}</main>")
        .include("card.html", &front("card", &[("layout", "\"loop\"")]))
        .layout("loop.html", &front("{{ content }}", &[("layout", "\"loop\"")]));

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, format!("<main>{CYCLIC_MARKER}</main>"));
}

#[tokio::test]
async fn test_layout_sees_page_data() {
    let site = SiteFixture::new()
        .page("post.html", &front("body", &[("title", "Post"), ("layout", "page")]))
        .layout("page.html", "<title>{{ title }}</title>{{ content }}");

    let out = site.resolver().resolve_path("post.html", Map::new()).await.unwrap();
    assert_eq!(out, "<title>Post</title>body");
}

#[tokio::test]
async fn test_json_frontmatter_and_each_in_layout() {
    let site = SiteFixture::new()
        .page(
            "index.html",
            "---json\n{\"tags\": [\"rust\", \"web\"], \"layout\": \"list\"}\n---\n{{ tags.length }} tags",
        )
        .layout("list.html", "<ul>{{ tags | each: t => \"<li>\" + t + \"</li>\" | safe }}</ul><p>{{ content }}</p>");

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, "<ul><li>rust</li><li>web</li></ul><p>2 tags</p>");
}

#[tokio::test]
async fn test_caller_functions_and_pending_values() {
    let site = SiteFixture::new().page("index.html", "{{ area(3, 4) }} {{ answer }}");
    let mut data = Map::new();
    data.insert(
        "area".to_string(),
        Value::function("area", |args| Ok(Value::from(args[0].to_number() * args[1].to_number()))),
    );
    data.insert(
        "answer".to_string(),
        Value::function("answer", |_| Ok(Value::pending(async { Ok(Value::from(42i64)) }))),
    );

    let out = site.resolver().resolve_path("index.html", data).await.unwrap();
    assert_eq!(out, "12 42");
}

#[tokio::test]
async fn test_document_without_template_features_is_unchanged() {
    let page = "<!doctype html>\n<p>Nothing to see: 1 < 2 && {single} braces</p>\n";
    let site = SiteFixture::new().page("plain.html", page);
    let out = site.resolver().resolve_path("plain.html", Map::new()).await.unwrap();
    assert_eq!(out, page);
}
