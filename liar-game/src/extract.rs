//! Tag extraction from free-form model output.
//!
//! Models are asked to wrap answers like `<word>sunny</word>`. Everything
//! around the tags is ignored.

/// Return the trimmed content of the first `<tag>...</tag>` pair in `text`.
///
/// Tag names match exactly and case-sensitively. The content may span
/// lines. `None` means no complete pair exists, which is different from an
/// empty pair (`Some("")`).
pub fn extract<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = text.find(&open)? + open.len();
    let end = start + text[start..].find(&close)?;
    Some(text[start..end].trim())
}

/// Like [`extract`], but blank content counts as missing
pub(crate) fn extract_non_empty(text: &str, tag: &str) -> Option<String> {
    extract(text, tag)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple() {
        assert_eq!(extract("<word>sunny</word> ok", "word"), Some("sunny"));
        assert_eq!(extract("no tags here", "word"), None);
    }

    #[test]
    fn test_extract_inside_prose_and_multiline() {
        let text = "I thought about it.\n<reason>\n  Waves are\n  everywhere\n</reason>\nDone.";
        assert_eq!(extract(text, "reason"), Some("Waves are\n  everywhere"));
    }

    #[test]
    fn test_extract_first_pair_wins() {
        let text = "<target>Bob</target> or maybe <target>Carol</target>";
        assert_eq!(extract(text, "target"), Some("Bob"));
    }

    #[test]
    fn test_extract_is_case_sensitive_and_exact() {
        assert_eq!(extract("<Word>sunny</Word>", "word"), None);
        assert_eq!(extract("<words>sunny</words>", "word"), None);
        assert_eq!(extract("<main_topic>ocean</main_topic>", "topic"), None);
    }

    #[test]
    fn test_extract_requires_closing_tag() {
        assert_eq!(extract("<word>sunny", "word"), None);
        assert_eq!(extract("</word>sunny<word>", "word"), None);
    }

    #[test]
    fn test_empty_tag_is_present() {
        assert_eq!(extract("<word>  </word>", "word"), Some(""));
        assert_eq!(extract_non_empty("<word>  </word>", "word"), None);
        assert_eq!(extract_non_empty("<word> tide </word>", "word"), Some("tide".into()));
    }
}
