//! Pulling the link and the visible label out of one anchor fragment.

use url::Url;

use crate::strip::strip_tags;

const HREF: &str = "href";

/// Read the `href` value of an anchor fragment and make it absolute.
///
/// The attribute name is matched literally. A quoted value runs to the
/// matching quote (or the end of the fragment when it never closes); an
/// unquoted one stops at the first space or `>`. Values that already start
/// with `http://` or `https://` come back untouched, anything else is joined
/// onto `base`. Missing, empty or unjoinable values give `None`.
///
/// ```
/// use storyline_scan::extract_href;
/// use url::Url;
///
/// let base = Url::parse("https://time.com").unwrap();
/// assert_eq!(
///     extract_href(r#"<a href="/7001/story/">x</a>"#, &base).as_deref(),
///     Some("https://time.com/7001/story/")
/// );
/// assert_eq!(extract_href("<a name=top>x</a>", &base), None);
/// ```
pub fn extract_href(fragment: &str, base: &Url) -> Option<String> {
    let name_at = fragment.find(HREF)?;
    let eq_at = name_at + fragment[name_at..].find('=')?;
    let value = fragment[eq_at + 1..].trim_start();
    let first = value.chars().next()?;

    let raw = match first {
        '"' | '\'' => {
            let quoted = &value[1..];
            match quoted.find(first) {
                Some(end) => &quoted[..end],
                None => quoted,
            }
        }
        _ => {
            let end = match (value.find(' '), value.find('>')) {
                (Some(sp), Some(gt)) => sp.min(gt),
                (Some(sp), None) => sp,
                (None, Some(gt)) => gt,
                (None, None) => value.len(),
            };
            &value[..end]
        }
    };

    let href = raw.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    match base.join(href) {
        Ok(url) => Some(url.into()),
        Err(err) => {
            tracing::trace!(%href, error = %err, "scan.href.unjoinable");
            None
        }
    }
}

/// Visible text of a label source, preferring the nested label element.
///
/// Without any `>` the whole fragment is treated as text. Otherwise the text
/// runs from the end of the first tag to the last `</label_tag>` (or to the
/// end when there is none), then tags are stripped.
///
/// ```
/// use storyline_scan::extract_label;
///
/// assert_eq!(extract_label("<span class=\"t\"> Big  story </span>", "span"), "Big story");
/// assert_eq!(extract_label("plain   words", "span"), "plain words");
/// ```
pub fn extract_label(fragment: &str, label_tag: &str) -> String {
    let Some(gt) = fragment.find('>') else {
        return strip_tags(fragment);
    };
    let closing = format!("</{label_tag}>");
    let inner = match fragment.rfind(&closing) {
        Some(end) => fragment.get(gt + 1..end).unwrap_or(""),
        None => &fragment[gt + 1..],
    };
    strip_tags(inner)
}
