//! Tag stripping and whitespace normalisation.

/// Drop every `<...>` span and collapse the remaining text.
///
/// Scanning is left to right: a `<` skips through the next `>`. An
/// unterminated `<` swallows the rest of the fragment. Runs of whitespace
/// become single spaces and the ends are trimmed, so stripping an already
/// stripped string gives it back unchanged.
///
/// ```
/// use storyline_scan::strip_tags;
///
/// assert_eq!(strip_tags("<b>Big</b>\n\t <i>news</i> "), "Big news");
/// assert_eq!(strip_tags("cut <here and the rest"), "cut");
/// ```
pub fn strip_tags(fragment: &str) -> String {
    let mut visible = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(lt) = rest.find('<') {
        visible.push_str(&rest[..lt]);
        match rest[lt + 1..].find('>') {
            Some(gt) => rest = &rest[lt + 1 + gt + 1..],
            None => return normalize_whitespace(&visible),
        }
    }
    visible.push_str(rest);
    normalize_whitespace(&visible)
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_nested_tags() {
        assert_eq!(
            strip_tags(r#"<span class="x"><em>Hello</em> world</span>"#),
            "Hello world"
        );
    }

    #[test]
    fn dangling_open_bracket_truncates() {
        assert_eq!(strip_tags("Hello <world"), "Hello");
        assert_eq!(strip_tags("<"), "");
    }

    #[test]
    fn stray_close_bracket_is_text() {
        assert_eq!(strip_tags("a > b"), "a > b");
    }

    #[test]
    fn collapses_all_whitespace_kinds() {
        assert_eq!(strip_tags("  one\n\ntwo\t three \r\n"), "one two three");
    }

    #[test]
    fn idempotent() {
        for input in [
            "<p>  Hello   World </p>",
            "plain text",
            "x<y",
            "a > b <c>d</c>",
            "",
            "<a href='/x'>Ünïcödé  títle</a>",
        ] {
            let once = strip_tags(input);
            assert_eq!(strip_tags(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn keeps_multibyte_text() {
        assert_eq!(strip_tags("<b>café</b> — naïve"), "café — naïve");
    }
}
