//! Slug derivation and filename sanitization.
//!
//! Slugs are externally visible identifiers, so both functions here must be
//! deterministic and stable across runs: the same input always yields the
//! same output, with no ambient state involved.

use pinyin::ToPinyin;

/// Derive a URL-safe slug from a source file path.
///
/// A trailing markup extension is stripped, runs of ASCII letters/digits
/// become tokens, each CJK ideograph becomes its own toneless-pinyin token,
/// and every other character separates tokens. Tokens are joined with `-`,
/// repeated separators collapse, and the result is lowercased.
pub fn slugify_path(path: &str) -> String {
    let clean = strip_markup_extension(path);

    let mut parts: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for c in clean.chars() {
        if let Some(py) = c.to_pinyin() {
            if !buffer.is_empty() {
                parts.push(std::mem::take(&mut buffer));
            }
            parts.push(py.plain().to_string());
        } else if c.is_ascii_alphanumeric() {
            buffer.push(c);
        } else {
            if !buffer.is_empty() {
                parts.push(std::mem::take(&mut buffer));
            }
            // Any other character acts as a separator.
            parts.push("-".to_string());
        }
    }
    if !buffer.is_empty() {
        parts.push(buffer);
    }

    let joined = parts.join("-");
    trim_separators(&collapse_separators(&joined)).to_lowercase()
}

/// Sanitize a filename for use in rewritten image links and store keys:
/// whitespace runs and repeated hyphens collapse to single hyphens,
/// leading/trailing hyphens are trimmed, and the result is lowercased.
///
/// Idempotent: sanitizing an already-sanitized name yields the same name.
pub fn sanitize_file_name(name: &str) -> String {
    let hyphenated: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    trim_separators(&collapse_separators(&hyphenated)).to_lowercase()
}

fn strip_markup_extension(path: &str) -> &str {
    let lower = path.to_ascii_lowercase();
    for ext in [".md", ".markdown"] {
        if lower.ends_with(ext) && path.len() > ext.len() {
            return &path[..path.len() - ext.len()];
        }
    }
    path
}

fn collapse_separators(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_hyphen = false;
    for c in s.chars() {
        if c == '-' {
            if !prev_hyphen {
                out.push(c);
            }
            prev_hyphen = true;
        } else {
            out.push(c);
            prev_hyphen = false;
        }
    }
    out
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches('-')
}
