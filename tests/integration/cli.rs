//! The `stitch` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stitch() -> Command {
    Command::cargo_bin("stitch").unwrap()
}

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::create_dir_all(root.join("_layouts")).unwrap();
    std::fs::write(root.join("index.md"), "---\nlayout: page\n---\n# {{ title }}\n").unwrap();
    std::fs::write(root.join("_layouts/page.html"), "<main>{{ content }}</main>").unwrap();
    temp
}

#[test]
fn test_render_to_stdout() {
    let temp = site();
    stitch()
        .args(["render", "index.md", "--data", r#"{"title": "Hi"}"#, "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout("<main><h1>Hi</h1>\n</main>");
}

#[test]
fn test_render_to_file() {
    let temp = site();
    let out = temp.path().join("public/index.html");
    stitch()
        .args(["-q", "render", "index.md", "--root"])
        .arg(temp.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert_eq!(std::fs::read_to_string(out).unwrap(), "<main><h1></h1>\n</main>");
}

#[test]
fn test_render_with_config_file() {
    let temp = site();
    std::fs::write(temp.path().join("custom.toml"), "layouts_root = \"nowhere\"\nmissing = \"empty\"\n").unwrap();
    stitch()
        .args(["render", "index.md", "--root"])
        .arg(temp.path())
        .arg("--config")
        .arg(temp.path().join("custom.toml"))
        .assert()
        .success()
        .stdout("<h1></h1>\n");
}

#[test]
fn test_inline_errors_are_logged() {
    let temp = site();
    std::fs::write(temp.path().join("broken.html"), "{{ nope }}").unwrap();
    stitch()
        .args(["render", "broken.html", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout("<template-error>Error: nope is not defined</template-error>")
        .stderr(predicate::str::contains("nope is not defined"));
}

#[test]
fn test_missing_file_fails() {
    let temp = site();
    stitch()
        .args(["render", "missing.html", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("resource not found: missing.html"));
}

#[test]
fn test_invalid_data_fails() {
    let temp = site();
    stitch()
        .args(["render", "index.md", "--data", "[1]", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data must be a JSON object"));
}

#[test]
fn test_ext() {
    stitch().args(["ext", "blog/post.md"]).assert().success().stdout(".html\n");
    stitch().args(["ext", "theme.css"]).assert().success().stdout(".css\n");
    stitch().args(["ext", "feed.xml"]).assert().success().stdout(".xml\n");
    stitch().args(["ext", "README"]).assert().success().stdout("\n");
}
