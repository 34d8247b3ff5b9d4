//! Parsers for free-form model output.

use crate::errors::InferenceError;

const FENCE: &str = "```";

/// Remove one surrounding layer of code-fence formatting and trim.
///
/// Two shapes are unwrapped: a reply that is a single fenced block, and a
/// fenced block introduced by one line of prose ending in `:` and followed
/// by at most one more line. Fences inside the body survive either way.
/// Anything else, including a document that merely contains a fenced
/// block, is returned trimmed.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(body) = whole_fence_body(trimmed) {
        return body.trim().to_string();
    }
    if let Some(body) = introduced_fence_body(trimmed) {
        return body.trim().to_string();
    }

    trimmed.to_string()
}

fn whole_fence_body(text: &str) -> Option<&str> {
    if text.len() < 2 * FENCE.len() || !text.starts_with(FENCE) || !text.ends_with(FENCE) {
        return None;
    }
    Some(drop_info_string(&text[FENCE.len()..text.len() - FENCE.len()]))
}

/// `Here is the merged file:` / fenced block / optional closing remark.
fn introduced_fence_body(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (intro, rest) = lines.split_first()?;
    if !intro.trim_end().ends_with(':') || intro.contains(FENCE) {
        return None;
    }
    if !rest.first()?.starts_with(FENCE) {
        return None;
    }
    let close = rest.iter().rposition(|line| line.trim_end() == FENCE)?;
    if close == 0 || rest.len() - close > 2 {
        return None;
    }
    Some(rest[1..close].join("\n"))
}

/// Skip the language tag that may follow an opening fence (```rust).
fn drop_info_string(after_fence: &str) -> &str {
    match after_fence.find('\n') {
        Some(nl) if !after_fence[..nl].contains(char::is_whitespace) => &after_fence[nl + 1..],
        Some(nl) if after_fence[..nl].trim().is_empty() => &after_fence[nl + 1..],
        Some(_) => after_fence,
        // Single line: only a recognised tag is dropped, `x = 1` stays intact.
        None => match after_fence.split_once(char::is_whitespace) {
            Some((tag, body)) if is_language_tag(tag) => body,
            _ => after_fence,
        },
    }
}

const LANGUAGE_TAGS: &[&str] = &[
    "bash", "c", "cpp", "cs", "csharp", "css", "diff", "go", "html", "java", "javascript", "js",
    "json", "jsx", "kotlin", "markdown", "md", "php", "py", "python", "rb", "rs", "ruby", "rust",
    "scala", "scss", "sh", "shell", "sql", "svelte", "swift", "text", "toml", "ts", "tsx",
    "typescript", "vue", "xml", "yaml", "yml", "zsh",
];

fn is_language_tag(word: &str) -> bool {
    LANGUAGE_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(word))
}

/// Return the first balanced `{ ... }` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count towards nesting.
pub fn extract_json_object(text: &str) -> Result<&str, InferenceError> {
    let start = text
        .find('{')
        .ok_or_else(|| InferenceError::ParseError("no JSON object found in response".into()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(InferenceError::ParseError(
        "unterminated JSON object in response".into(),
    ))
}
