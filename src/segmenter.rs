use kuchikikiki::NodeRef;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document;
use crate::selector::ElementGroup;

// @module: Sentence segmentation of element text content

// @const: Sentence boundary regex
//
// A leading run of characters up to and including the next terminal
// punctuation mark, optionally followed by a single closing quotation mark.
// Deliberately a fixed heuristic: it mis-splits abbreviations and decimal
// numbers, and callers rely on that output staying stable.
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[^.?!]*[.?!]["”'’]?"#).unwrap()
});

/// Class name tagging each sentence wrapper so it can be located afterward
pub const WRAPPER_CLASS: &str = "wrapped-sentence";

/// One wrapped, independently highlightable fragment of segmented text
#[derive(Clone)]
pub struct SentenceUnit {
    /// Position in the ordered sequence, 0-based
    pub index: usize,

    /// The wrapper node owning this sentence in the document
    pub node: NodeRef,
}

impl SentenceUnit {
    /// Decoded plain text of the sentence
    pub fn text(&self) -> String {
        document::plain_text(&self.node)
    }
}

/// Split text into sentences using the punctuation-boundary heuristic.
///
/// The input is trimmed once at the element level. Matching is
/// greedy-leftmost on each remaining buffer; a trailing fragment without
/// terminal punctuation is emitted as-is (leading whitespace included), so
/// the concatenation of the returned sentences equals the trimmed input
/// whenever a non-empty remainder exists.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut remainder = text.trim();
    let mut sentences = Vec::new();

    while let Some(found) = SENTENCE_BOUNDARY.find(remainder) {
        sentences.push(found.as_str().to_string());
        remainder = &remainder[found.end()..];
    }

    // Trailing fragments without punctuation are never dropped.
    if !remainder.trim().is_empty() {
        sentences.push(remainder.to_string());
    }

    sentences
}

/// Split one element's text content into sentences and replace its content
/// with one wrapper per sentence, in match order.
///
/// The element's rendered text is used, so inline tags inside a sentence are
/// flattened into plain text before wrapping. An element with only
/// whitespace content yields zero units and is left unmodified.
pub fn segment_element(element: &NodeRef) -> usize {
    let text = element.text_contents();
    let sentences = split_sentences(&text);
    if sentences.is_empty() {
        return 0;
    }

    let children: Vec<NodeRef> = element.children().collect();
    for child in children {
        child.detach();
    }

    for sentence in &sentences {
        let wrapper = document::new_element("span", &[("class", WRAPPER_CLASS)]);
        wrapper.append(NodeRef::new_text(sentence.as_str()));
        element.append(wrapper);
    }

    sentences.len()
}

/// Segment every element in the given groups, mutating the document in
/// place. Returns the number of sentence units created.
pub fn segment(groups: &[ElementGroup]) -> usize {
    let mut count = 0;
    for group in groups {
        for element in &group.elements {
            count += segment_element(element);
        }
    }
    debug!("Parsed {} sentences", count);
    count
}

/// Collect the sentence wrappers of a segmented document, in document order.
pub fn collect_units(document: &NodeRef) -> Vec<SentenceUnit> {
    let selector = format!("span.{}", WRAPPER_CLASS);
    match document.select(&selector) {
        Ok(matches) => matches
            .enumerate()
            .map(|(index, element)| SentenceUnit {
                index,
                node: element.as_node().clone(),
            })
            .collect(),
        Err(()) => Vec::new(),
    }
}
