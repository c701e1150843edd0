//! Locating heading blocks in a raw document.
//!
//! Tag names are matched against an ASCII-lowercased copy of the document.
//! ASCII lowercasing keeps every byte offset identical to the original, so
//! positions found in the lowered view slice the original text directly and
//! the block content keeps its case.

/// Iterator over the inner markup of every `<tag ...>...</tag>` pair, in
/// document order.
///
/// Each block ends at the first closing tag after its opening tag, so a
/// nested element with the same name cuts the outer block short. Any
/// missing opening tag end or closing tag ends the iteration.
pub struct Blocks<'a> {
    document: &'a str,
    lowered: String,
    open: String,
    close: String,
    cursor: usize,
}

impl<'a> Blocks<'a> {
    pub fn new(document: &'a str, tag_name: &str) -> Self {
        let tag = tag_name.to_ascii_lowercase();
        Self {
            document,
            lowered: document.to_ascii_lowercase(),
            open: format!("<{tag}"),
            close: format!("</{tag}>"),
            cursor: 0,
        }
    }

    fn locate(&self) -> Option<(usize, usize)> {
        let lowered = self.lowered.as_str();
        let start = self.cursor + lowered[self.cursor..].find(&self.open)?;
        let open_end = start + lowered[start..].find('>')?;
        let close = open_end + lowered[open_end..].find(&self.close)?;
        Some((open_end + 1, close))
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        match self.locate() {
            Some((inner_start, close)) => {
                self.cursor = close + self.close.len();
                Some(&self.document[inner_start..close])
            }
            None => {
                self.cursor = self.lowered.len();
                None
            }
        }
    }
}

/// Collect the inner markup of every heading block named `tag_name`.
///
/// ```
/// use storyline_scan::extract_blocks;
///
/// let doc = "<H3 class=\"t\">One</H3><p>skip</p><h3>Two</h3><h3>broken";
/// assert_eq!(extract_blocks(doc, "h3"), vec!["One", "Two"]);
/// ```
pub fn extract_blocks<'a>(document: &'a str, tag_name: &str) -> Vec<&'a str> {
    Blocks::new(document, tag_name).collect()
}
