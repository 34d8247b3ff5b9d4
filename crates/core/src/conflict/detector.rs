//! Conflict marker detection and language inference.
//!
//! [`has_conflict_markers`] is the sole ground truth for "still conflicted"
//! across the engine: it is re-checked after every resolution attempt and
//! before every write to the working tree.

use std::path::Path;

/// Opens the current-side hunk.
pub const MARKER_BEGIN: &str = "<<<<<<<";
/// Separates current from incoming.
pub const MARKER_SEPARATOR: &str = "=======";
/// Closes the incoming-side hunk.
pub const MARKER_END: &str = ">>>>>>>";

/// True iff `content` contains all three conflict marker sequences.
pub fn has_conflict_markers(content: &str) -> bool {
    content.contains(MARKER_BEGIN)
        && content.contains(MARKER_SEPARATOR)
        && content.contains(MARKER_END)
}

/// Number of conflict hunks (begin markers at the start of a line).
pub fn count_conflict_hunks(content: &str) -> usize {
    content
        .lines()
        .filter(|line| line.starts_with(MARKER_BEGIN))
        .count()
}

/// Language name for a path, from its extension. Unknown extensions map to
/// `text`.
pub fn language_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" | "pyi" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "scala" => "scala",
        "css" => "css",
        "scss" | "sass" => "scss",
        "html" | "htm" => "html",
        "vue" => "vue",
        "svelte" => "svelte",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "shell",
        _ => "text",
    }
}
