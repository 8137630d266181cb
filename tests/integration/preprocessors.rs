//! Preprocessors running inside full resolutions.

use futures::future::BoxFuture;
use stitch_cli::core::Result;
use stitch_cli::expression::Map;
use stitch_cli::preprocess::{PathMatcher, Preprocessor, PreprocessorSet};
use stitch_cli::test_utils::SiteFixture;

use crate::CYCLIC_MARKER;

#[tokio::test]
async fn test_html_include_directive() {
    let site = SiteFixture::new()
        .page("index.html", "<h1>{{ title }}</h1>\n<html-include src=\"article.html\" text=\"muh\">")
        .include("article.html", "<article>{{ text }}</article>");

    let mut data = Map::new();
    data.insert("title".to_string(), "test".into());
    let out = site.resolver().resolve_path("index.html", data).await.unwrap();
    assert_eq!(out, "<h1>test</h1>\n<article>muh</article>");
}

#[tokio::test]
async fn test_html_include_and_placeholder_share_cycle_detection() {
    let site = SiteFixture::new()
        .page("index.html", "<html-include src=\"a.html\">")
        .include("a.html", "[{{ include(\"b.html\") | safe }}]")
        .include("b.html", "<html-include src=\"a.html\">");

    let out = site.resolver().resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, format!("[{CYCLIC_MARKER}]"));
}

#[tokio::test]
async fn test_css_imports_are_bundled() {
    let site = SiteFixture::new()
        .page("styles.css", "@import \"vendor/_reset.css\";\n")
        .page("vendor/_reset.css", "* { box-sizing: border-box; }\n");

    let out = site.resolver().resolve_path("styles.css", Map::new()).await.unwrap();
    assert_eq!(out, "* { box-sizing: border-box; }\n");
}

#[tokio::test]
async fn test_nested_css_imports_are_relative_to_each_file() {
    let site = SiteFixture::new()
        .page("css/site.css", "@import url(\"parts/base.css\");\nmain {}\n")
        .page("css/parts/base.css", "@import '../tokens.css';\nbody {}\n")
        .page("css/tokens.css", ":root {}\n");

    let out = site.resolver().resolve_path("css/site.css", Map::new()).await.unwrap();
    assert_eq!(out, ":root {}\nbody {}\nmain {}\n");
}

#[tokio::test]
async fn test_markdown_with_includes() {
    let site = SiteFixture::new()
        .page(
            "index.md",
            "# Headline\n\nLorem ipsum dolor sit amet.\n\n<html-include src=\"./test.md\">\n\n<html-include src=\"./test2.html\">\n",
        )
        .page("test.md", "## Headline 2\n\nmuh\n")
        .page("test2.html", "<h3>Headline 3</h3>");

    let out = site.resolver().resolve_path("index.md", Map::new()).await.unwrap();
    let positions: Vec<usize> = [
        "<h1>Headline</h1>",
        "<p>Lorem ipsum dolor sit amet.</p>",
        "<h2>Headline 2</h2>",
        "<p>muh</p>",
        "<h3>Headline 3</h3>",
    ]
    .iter()
    .map(|needle| out.find(needle).unwrap_or_else(|| panic!("missing {needle} in {out}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
    assert!(!out.contains("html-include"));
}

#[tokio::test]
async fn test_markdown_keeps_placeholders_intact() {
    let site = SiteFixture::new().page("post.md", "# {{ title }}\n\n{{ count > 1 && show_count ? count : \"one\" }}\n");
    let mut data = Map::new();
    data.insert("title".to_string(), "A_b_c".into());
    data.insert("count".to_string(), 3i64.into());
    data.insert("show_count".to_string(), true.into());

    let out = site.resolver().resolve_path("post.md", data).await.unwrap();
    assert_eq!(out, "<h1>A_b_c</h1>\n<p>3</p>\n");
}

#[tokio::test]
async fn test_markdown_layout_uses_html_extension() {
    let site = SiteFixture::new()
        .page("post.md", "---\nlayout: page\n---\n*hi*\n")
        .layout("page.html", "<main>{{ content }}</main>");

    let resolver = site.resolver();
    assert_eq!(resolver.output_extension("post.md"), ".html");
    let out = resolver.resolve_path("post.md", Map::new()).await.unwrap();
    assert_eq!(out, "<main><p><em>hi</em></p>\n</main>");
}

struct Shout;

impl Preprocessor for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn matcher(&self) -> &PathMatcher {
        static MATCHER: std::sync::OnceLock<PathMatcher> = std::sync::OnceLock::new();
        MATCHER.get_or_init(|| PathMatcher::suffix(".shout"))
    }

    fn output_extension(&self) -> &str {
        ".txt"
    }

    fn process<'a>(&'a self, content: &'a str, _data: &'a Map) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(content.to_uppercase()) })
    }
}

#[tokio::test]
async fn test_custom_preprocessor() {
    let site = SiteFixture::new().page("hello.shout", "hello {{ name }}");
    let resolver = site
        .resolver()
        .with_preprocessors(PreprocessorSet::default().with(Shout));

    assert_eq!(resolver.output_extension("hello.shout"), ".txt");
    let mut data = Map::new();
    data.insert("NAME".to_string(), "world".into());
    let out = resolver.resolve_path("hello.shout", data).await.unwrap();
    assert_eq!(out, "HELLO world");
}

#[tokio::test]
async fn test_without_preprocessors_content_passes_through() {
    let site = SiteFixture::new().page("index.html", "<html-include src=\"x.html\">");
    let resolver = site.resolver().with_preprocessors(PreprocessorSet::empty());
    let out = resolver.resolve_path("index.html", Map::new()).await.unwrap();
    assert_eq!(out, "<html-include src=\"x.html\">");
}
