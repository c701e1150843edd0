//! Tolerant headline scanner.
//!
//! Pulls `{title, link}` stories out of a page by plain substring search
//! rather than a DOM:
//!
//! - [`blocks`]: inner markup of every heading of a given tag, in order
//! - [`anchor`]: the `href` of an anchor (made absolute) and its visible label
//! - [`strip`]: tag removal and whitespace normalisation
//! - [`stories`]: first qualifying anchor per block, capped at a limit
//!
//! Malformed markup never produces an error. Missing pieces simply mean a
//! block or anchor contributes nothing, so a damaged page yields fewer
//! stories instead of a failure.
//!
//! ```
//! use storyline_scan::StoryScanner;
//! use url::Url;
//!
//! let page = r#"
//!   <h3 class="headline"><a href="/6300001/markets/"><span>Markets rally</span></a></h3>
//!   <h3><a href="https://ext.com/p">Outside link</a></h3>
//! "#;
//! let scanner = StoryScanner::new(Url::parse("https://time.com").unwrap());
//! let stories = scanner.extract_stories(page, "h3", 6);
//!
//! assert_eq!(stories.len(), 2);
//! assert_eq!(stories[0].link, "https://time.com/6300001/markets/");
//! assert_eq!(stories[1].title, "Outside link");
//! ```

pub mod anchor;
pub mod blocks;
pub mod stories;
pub mod strip;

pub use anchor::{extract_href, extract_label};
pub use blocks::{Blocks, extract_blocks};
pub use stories::{
    DEFAULT_BASE_URL, DEFAULT_LABEL_TAG, DEFAULT_LIMIT, DEFAULT_MIN_TITLE_CHARS, Story,
    StoryScanner, extract_stories,
};
pub use strip::{normalize_whitespace, strip_tags};
