//! Path identifier arithmetic.
//!
//! Identifiers are forward-slash strings relative to the source root. They are
//! compared in normalised form, so `./a/../b.html`, `/b.html` and `b.html` all
//! name the same document.

/// Fold `.` and `..` segments, convert backslashes and drop leading slashes.
///
/// `..` segments that climb above the root are kept so a source can reject
/// them.
///
/// ```rust
/// use stitch_cli::resolver::paths::normalize;
///
/// assert_eq!(normalize("./blog/../_includes//nav.html"), "_includes/nav.html");
/// assert_eq!(normalize("\\a\\b.css"), "a/b.css");
/// assert_eq!(normalize("../x"), "../x");
/// ```
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory part of a normalised identifier (`""` for the root).
pub fn parent(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
        normalize(path)
    } else {
        normalize(&format!("{base}/{path}"))
    }
}

/// Resolve an include target seen in the document at `current`.
///
/// - `./x` and `../x` are relative to the including document's directory.
/// - `/x` is relative to the source root.
/// - Anything else lives below `includes_root`.
pub fn resolve_include(current: &str, target: &str, includes_root: &str) -> String {
    let target = target.trim();
    if target.starts_with("./") || target.starts_with("../") {
        join(parent(&normalize(current)), target)
    } else if target.starts_with('/') {
        normalize(target)
    } else {
        join(includes_root, target)
    }
}

/// Resolve a layout reference below `layouts_root`.
///
/// A reference whose file name has no extension gets `extension` appended,
/// which is the predicted output extension of the document being wrapped.
pub fn resolve_layout(reference: &str, layouts_root: &str, extension: &str) -> String {
    let reference = reference.trim();
    let file_name = reference.rsplit(['/', '\\']).next().unwrap_or(reference);
    let path = join(layouts_root, reference.trim_start_matches('/'));
    if file_name.contains('.') {
        path
    } else {
        format!("{path}{extension}")
    }
}
