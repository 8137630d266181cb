//! Sites on disk.

use std::path::Path;

use anyhow::Result;
use stitch_cli::config::{MergePolicy, MissingPolicy, ResolveConfig};
use stitch_cli::expression::Map;
use stitch_cli::resolver::Resolver;
use stitch_cli::source::FsSource;
use tempfile::TempDir;
use tokio::fs;

async fn write(root: &Path, path: &str, content: &str) -> Result<()> {
    let file = root.join(path);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(file, content).await?;
    Ok(())
}

#[tokio::test]
async fn test_site_on_disk() -> Result<()> {
    let temp = TempDir::new()?;
    let root = temp.path();
    write(root, "index.html", "---\ntitle: Home\nlayout: base\n---\n<html-include src=\"nav.html\">{{ title }}").await?;
    write(root, "_includes/nav.html", "<nav>{{ title }}</nav>").await?;
    write(root, "_layouts/base.html", "<body>{{ content }}</body>").await?;

    let resolver = Resolver::new(FsSource::new(root));
    let out = resolver.resolve_path("index.html", Map::new()).await?;
    assert_eq!(out, "<body><nav>Home</nav>Home</body>");
    Ok(())
}

#[tokio::test]
async fn test_configured_roots_and_policies() -> Result<()> {
    let temp = TempDir::new()?;
    let root = temp.path();
    write(
        root,
        "stitch.toml",
        "includes_root = \"partials\"\nlayouts_root = \"layouts\"\nmerge = \"deep\"\nmissing = \"empty\"\n",
    )
    .await?;
    write(root, "page.html", "---\nlayout: main\n---\n{{ include(\"a.html\") }}{{ include(\"gone.html\") }}").await?;
    write(root, "partials/a.html", "A").await?;
    write(root, "layouts/main.html", "[{{ content }}]").await?;

    let config = ResolveConfig::load_or_default(root).await?;
    assert_eq!(config.merge, MergePolicy::Deep);
    assert_eq!(config.missing, MissingPolicy::Empty);

    let resolver = Resolver::new(FsSource::new(root)).with_config(config);
    assert_eq!(resolver.resolve_path("page.html", Map::new()).await?, "[A]");
    Ok(())
}

#[tokio::test]
async fn test_missing_top_level_file() -> Result<()> {
    let temp = TempDir::new()?;
    let resolver = Resolver::new(FsSource::new(temp.path()));
    let err = resolver.resolve_path("nope.html", Map::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "resource not found: nope.html");
    Ok(())
}

#[tokio::test]
async fn test_include_escaping_root_is_inline_error() -> Result<()> {
    let temp = TempDir::new()?;
    let root = temp.path().join("site");
    write(&root, "index.html", "x{{ include(\"../../secret.txt\") }}y").await?;
    write(temp.path(), "secret.txt", "secret").await?;

    let resolver = Resolver::new(FsSource::new(&root));
    let out = resolver.resolve_path("index.html", Map::new()).await?;
    assert!(out.starts_with("x<template-error>Error: failed to load '../../secret.txt'"), "{out}");
    assert!(!out.contains("secret</"));
    assert!(out.ends_with("</template-error>y"));
    Ok(())
}
