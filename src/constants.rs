//! Global constants used throughout the stitch codebase.
//!
//! Default directory roots, marker tags and scanning bounds live here so that
//! the resolver, the rendering engine and the configuration layer agree on them.

/// Opening tag of an inline error marker.
pub const ERROR_MARKER_OPEN: &str = "<template-error>";

/// Closing tag of an inline error marker.
pub const ERROR_MARKER_CLOSE: &str = "</template-error>";

/// Default directory that bare include paths are resolved under.
pub const DEFAULT_INCLUDES_ROOT: &str = "_includes";

/// Default directory that layout references are resolved under.
pub const DEFAULT_LAYOUTS_ROOT: &str = "_layouts";

/// Maximum number of characters between `{{` and `}}` for a placeholder.
///
/// Longer spans are left untouched as literal text.
pub const MAX_PLACEHOLDER_CHARS: usize = 1024;

/// Frontmatter delimiter line.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Frontmatter opening line announcing a JSON object block.
pub const FRONTMATTER_JSON_DELIMITER: &str = "---json";

/// Name under which the include capability is bound into document data.
pub const INCLUDE_HELPER: &str = "include";

/// Name under which a layout receives the rendered body.
pub const LAYOUT_CONTENT_KEY: &str = "content";

/// Frontmatter key selecting a layout.
pub const LAYOUT_KEY: &str = "layout";

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "stitch.toml";

/// Deepest nesting the expression parser accepts.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Deepest chain of nested evaluations, including arrow function calls.
pub const MAX_EVALUATION_DEPTH: usize = 128;
