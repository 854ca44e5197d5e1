// Tests for slug derivation and filename sanitization. Slugs are externally
// visible identifiers, so these pin the exact output format.

use vault_mirror_core::slug::{sanitize_file_name, slugify_path};

struct SlugCase {
    name: &'static str,
    input: &'static str,
    expected: &'static str,
}

#[test]
fn test_slugify_path_table_driven() {
    let cases = vec![
        SlugCase {
            name: "plain ascii path",
            input: "Article/Hello World.md",
            expected: "article-hello-world",
        },
        SlugCase {
            name: "chinese characters become per-character pinyin tokens",
            input: "Article/我的文章.md",
            expected: "article-wo-de-wen-zhang",
        },
        SlugCase {
            name: "mixed ascii and chinese",
            input: "Article/Rust 入门.md",
            expected: "article-rust-ru-men",
        },
        SlugCase {
            name: "digits survive, punctuation separates",
            input: "Article/2024-01 Notes.md",
            expected: "article-2024-01-notes",
        },
        SlugCase {
            name: "markdown extension stripped case-insensitively",
            input: "Article/NOTES.MD",
            expected: "article-notes",
        },
        SlugCase {
            name: "long markdown extension stripped",
            input: "Article/readme.markdown",
            expected: "article-readme",
        },
        SlugCase {
            name: "repeated separators collapse",
            input: "Article//a - - b.md",
            expected: "article-a-b",
        },
        SlugCase {
            name: "leading and trailing separators trimmed",
            input: "-trim me-.md",
            expected: "trim-me",
        },
        SlugCase {
            name: "non-markdown extension kept as token",
            input: "Article/data.csv",
            expected: "article-data-csv",
        },
    ];

    for case in cases {
        assert_eq!(
            slugify_path(case.input),
            case.expected,
            "{}: slugify_path({:?})",
            case.name,
            case.input
        );
    }
}

#[test]
fn test_slugify_path_is_deterministic() {
    let input = "Article/中文 And English 123.md";
    let first = slugify_path(input);
    for _ in 0..10 {
        assert_eq!(
            slugify_path(input),
            first,
            "Slug must be stable across repeated invocations"
        );
    }
}

#[test]
fn test_sanitize_file_name_table_driven() {
    let cases = vec![
        SlugCase {
            name: "single space to hyphen, lowercased",
            input: "My Photo.png",
            expected: "my-photo.png",
        },
        SlugCase {
            name: "whitespace run collapses to one hyphen",
            input: "a   b.png",
            expected: "a-b.png",
        },
        SlugCase {
            name: "repeated hyphens collapse",
            input: "a--b.png",
            expected: "a-b.png",
        },
        SlugCase {
            name: "leading and trailing hyphens trimmed",
            input: "- edge -.png",
            expected: "edge-.png",
        },
        SlugCase {
            name: "already clean name unchanged",
            input: "photo.png",
            expected: "photo.png",
        },
    ];

    for case in cases {
        assert_eq!(
            sanitize_file_name(case.input),
            case.expected,
            "{}: sanitize_file_name({:?})",
            case.name,
            case.input
        );
    }
}

#[test]
fn test_sanitize_file_name_is_idempotent() {
    let inputs = ["My Photo.png", "a   b--c.png", "-x-.png", "中文 图.png"];
    for input in inputs {
        let once = sanitize_file_name(input);
        assert_eq!(
            sanitize_file_name(&once),
            once,
            "Sanitizing a sanitized name must be a no-op (input {input:?})"
        );
    }
}
