//! Rendered strings with attribute spans.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

/// A range of a rendered string annotated by a markup tag. `start` and
/// `end` are byte offsets into the rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Byte offset where the span opens.
    pub start: usize,
    /// Byte offset where the span closes. Equal to `start` for
    /// zero-length (self-closing or empty) spans.
    pub end: usize,
    /// The tag name.
    pub name: String,
    /// The tag's `key="value"` properties, rendered.
    pub props: FxHashMap<String, String>,
}

/// A rendered string plus the attribute spans over it.
///
/// Attribute events are indexed by byte position: at each position, the
/// attributes that open or close there, in the order they appeared in the
/// markup. A zero-length span appears exactly once, at its position.
#[derive(Debug, Clone, Default)]
pub struct AttributedString {
    pub(crate) text: String,
    pub(crate) attributes: Vec<Attribute>,
    /// position -> indices into `attributes` that open or close there.
    pub(crate) events: BTreeMap<usize, Vec<usize>>,
}

impl AttributedString {
    /// The rendered text without attributes.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All attribute spans, in markup order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Visits each change in attribute state in ascending byte position.
    ///
    /// `visit` receives the position and the attributes that open or close
    /// there, in the order they were read from the markup. An open and
    /// close pair at the same position (a zero-length span) is visited
    /// once, in the order of its open tag.
    pub fn scan_events(&self, mut visit: impl FnMut(usize, &[&Attribute])) {
        for (pos, ids) in &self.events {
            let atts: Vec<&Attribute> = ids.iter().map(|&id| &self.attributes[id]).collect();
            visit(*pos, &atts);
        }
    }
}

impl fmt::Display for AttributedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
