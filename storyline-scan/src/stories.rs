//! Turning heading blocks into a bounded list of stories.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::anchor::{extract_href, extract_label};
use crate::blocks::Blocks;

/// Site the home page scanner resolves relative links against by default.
pub const DEFAULT_BASE_URL: &str = "https://time.com";
pub const DEFAULT_LABEL_TAG: &str = "span";
pub const DEFAULT_MIN_TITLE_CHARS: usize = 3;
pub const DEFAULT_LIMIT: usize = 6;

const ANCHOR_OPEN: &str = "<a";
const ANCHOR_CLOSE: &str = "</a>";

/// One headline: visible title plus absolute link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub link: String,
}

/// Why an anchor did not become a story; only used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NoLink,
    EmptyTitle,
    ShortTitle,
}

/// Scanner settings shared by every extraction.
///
/// The scanner holds no mutable state, so one instance can serve any number
/// of threads at once.
#[derive(Debug, Clone)]
pub struct StoryScanner {
    base: Url,
    label_tag: String,
    min_title_chars: usize,
}

impl Default for StoryScanner {
    fn default() -> Self {
        let base = Url::parse(DEFAULT_BASE_URL).expect("default base URL parses");
        Self::new(base)
    }
}

impl StoryScanner {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            label_tag: DEFAULT_LABEL_TAG.to_string(),
            min_title_chars: DEFAULT_MIN_TITLE_CHARS,
        }
    }

    /// Element whose text is preferred as the title when nested in an anchor.
    pub fn with_label_tag(mut self, tag: &str) -> Self {
        self.label_tag = tag.to_ascii_lowercase();
        self
    }

    /// Minimum title length, counted in characters after normalisation.
    pub fn with_min_title_chars(mut self, min: usize) -> Self {
        self.min_title_chars = min;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Scan `document` for `tag_name` headings and return at most `limit`
    /// stories in document order.
    ///
    /// ```
    /// use storyline_scan::{Story, StoryScanner};
    /// use url::Url;
    ///
    /// let scanner = StoryScanner::new(Url::parse("https://news.example.org").unwrap());
    /// let doc = r#"<h2><a href="/a">First story</a></h2><h2><a href="/b">Second</a></h2>"#;
    ///
    /// assert_eq!(
    ///     scanner.extract_stories(doc, "h2", 1),
    ///     vec![Story {
    ///         title: "First story".into(),
    ///         link: "https://news.example.org/a".into(),
    ///     }]
    /// );
    /// ```
    pub fn extract_stories(&self, document: &str, tag_name: &str, limit: usize) -> Vec<Story> {
        let stories = self.build_stories(Blocks::new(document, tag_name), limit);
        tracing::debug!(
            target: "scan",
            tag = %tag_name,
            limit,
            found = stories.len(),
            doc_bytes = document.len(),
            "scan.extract.done"
        );
        stories
    }

    /// Take the first qualifying anchor of each block until `limit` stories
    /// have been collected.
    pub fn build_stories<'a, I>(&self, blocks: I, limit: usize) -> Vec<Story>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stories = Vec::with_capacity(limit.min(16));
        for (index, block) in blocks.into_iter().enumerate() {
            if stories.len() >= limit {
                break;
            }
            match self.first_story(block) {
                Some(story) => {
                    tracing::trace!(target: "scan", block = index, link = %story.link, "scan.block.accepted");
                    stories.push(story);
                }
                None => tracing::trace!(target: "scan", block = index, "scan.block.empty"),
            }
        }
        stories
    }

    /// First anchor in `block` that yields a link and a long enough title.
    fn first_story(&self, block: &str) -> Option<Story> {
        let mut cursor = 0;
        loop {
            let start = cursor + block[cursor..].find(ANCHOR_OPEN)?;
            let tag_end = start + block[start..].find('>')?;
            let close = tag_end + block[tag_end..].find(ANCHOR_CLOSE)?;
            let fragment = &block[start..close + ANCHOR_CLOSE.len()];

            match self.story_from_anchor(fragment, tag_end - start) {
                Ok(story) => return Some(story),
                Err(reason) => {
                    tracing::trace!(target: "scan", ?reason, offset = start, "scan.anchor.rejected");
                    cursor = close + ANCHOR_CLOSE.len();
                }
            }
        }
    }

    /// `tag_end` is the offset of the `>` closing the anchor's opening tag.
    fn story_from_anchor(&self, fragment: &str, tag_end: usize) -> Result<Story, Rejection> {
        let link = extract_href(fragment, &self.base);
        let title = extract_label(self.label_source(fragment, tag_end), &self.label_tag);

        let Some(link) = link else {
            return Err(Rejection::NoLink);
        };
        if title.is_empty() {
            return Err(Rejection::EmptyTitle);
        }
        if title.chars().count() < self.min_title_chars {
            return Err(Rejection::ShortTitle);
        }
        Ok(Story { title, link })
    }

    /// Part of the anchor the title is read from: the nested label element
    /// when it is complete, the whole anchor when it is not, and the anchor
    /// body (everything before the fixed-width `</a>`) when there is none.
    fn label_source<'f>(&self, fragment: &'f str, tag_end: usize) -> &'f str {
        let open = format!("<{}", self.label_tag);
        let close = format!("</{}>", self.label_tag);

        let Some(label_start) = fragment.find(&open) else {
            let body_end = fragment.len() - ANCHOR_CLOSE.len();
            return fragment.get(tag_end + 1..body_end).unwrap_or("");
        };
        let label_close = fragment[label_start..]
            .find('>')
            .map(|gt| label_start + gt)
            .and_then(|label_tag_end| {
                fragment[label_tag_end..]
                    .find(&close)
                    .map(|at| label_tag_end + at)
            });
        match label_close {
            Some(at) => &fragment[label_start..at + close.len()],
            None => fragment,
        }
    }
}

/// Extract stories with the default base URL, label tag and title minimum.
///
/// ```
/// use storyline_scan::extract_stories;
///
/// let doc = r#"<h3>x<a href="/a">  Hello   World  </a></h3>"#;
/// let stories = extract_stories(doc, "h3", 1);
/// assert_eq!(stories.len(), 1);
/// assert_eq!(stories[0].title, "Hello World");
/// assert_eq!(stories[0].link, "https://time.com/a");
/// ```
pub fn extract_stories(document: &str, tag_name: &str, limit: usize) -> Vec<Story> {
    StoryScanner::default().extract_stories(document, tag_name, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> StoryScanner {
        StoryScanner::new(Url::parse("https://time.com").unwrap())
    }

    #[test]
    fn label_source_prefers_complete_span() {
        let frag = r#"<a href="/x"><i>kicker</i><span class="t">Title</span></a>"#;
        assert_eq!(
            scanner().label_source(frag, 12),
            r#"<span class="t">Title</span>"#
        );
    }

    #[test]
    fn label_source_falls_back_to_whole_anchor_on_open_span() {
        let frag = r#"<a href="/x"><span>Title</a>"#;
        assert_eq!(scanner().label_source(frag, 12), frag);
    }

    #[test]
    fn label_source_without_span_is_anchor_body() {
        let frag = r#"<a href="/x"> Body <b>text</b> </a>"#;
        assert_eq!(scanner().label_source(frag, 12), " Body <b>text</b> ");
    }

    #[test]
    fn rejection_reasons() {
        let s = scanner();
        assert_eq!(
            s.story_from_anchor("<a name=x>Enough</a>", 9),
            Err(Rejection::NoLink)
        );
        assert_eq!(
            s.story_from_anchor(r#"<a href="/x">   </a>"#, 12),
            Err(Rejection::EmptyTitle)
        );
        assert_eq!(
            s.story_from_anchor(r#"<a href="/x">ab</a>"#, 12),
            Err(Rejection::ShortTitle)
        );
    }

    #[test]
    fn title_minimum_is_counted_in_characters() {
        let s = scanner();
        let story = s
            .story_from_anchor(r#"<a href="/x">日本語</a>"#, 12)
            .expect("three characters");
        assert_eq!(story.title, "日本語");
    }

    #[test]
    fn custom_minimum_and_label_tag() {
        let s = scanner().with_label_tag("EM").with_min_title_chars(1);
        let doc = r#"<h3><a href="/x"><em>Q</em></a></h3>"#;
        assert_eq!(
            s.extract_stories(doc, "h3", 6),
            vec![Story {
                title: "Q".into(),
                link: "https://time.com/x".into()
            }]
        );
    }

    #[test]
    fn zero_limit_yields_nothing() {
        let doc = r#"<h3><a href="/a">Valid title</a></h3>"#;
        assert!(scanner().extract_stories(doc, "h3", 0).is_empty());
    }

    #[test]
    fn story_serializes_title_then_link() {
        let story = Story {
            title: "Hello World".into(),
            link: "https://time.com/a".into(),
        };
        assert_eq!(
            serde_json::to_string(&story).unwrap(),
            r#"{"title":"Hello World","link":"https://time.com/a"}"#
        );
    }
}
