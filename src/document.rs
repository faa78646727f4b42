use anyhow::{Result, anyhow};
use html5ever::{LocalName, Namespace, QualName};
use kuchikikiki::traits::TendrilSink;
use kuchikikiki::{Attribute, ExpandedName};
pub use kuchikikiki::NodeRef;

// @module: Thin wrappers around the mutable HTML document tree

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse an HTML string into a document tree.
///
/// The parser follows the HTML5 specification; an implicit `<html>`, `<head>`
/// and `<body>` are synthesised when missing, and character entities are
/// decoded into their plain-text form.
pub fn parse_html(html: &str) -> NodeRef {
    kuchikikiki::parse_html().one(html)
}

/// Create a detached HTML element with the given attributes.
pub fn new_element(name: &str, attributes: &[(&str, &str)]) -> NodeRef {
    let qual_name = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(name),
    );
    let attributes = attributes.iter().map(|(key, value)| {
        (
            ExpandedName::new("", *key),
            Attribute {
                prefix: None,
                value: (*value).to_string(),
            },
        )
    });
    NodeRef::new_element(qual_name, attributes)
}

/// Append a `<style>` rule to the document head.
pub fn inject_style_rule(document: &NodeRef, css_text: &str) -> Result<()> {
    let head = document
        .select_first("head")
        .map_err(|()| anyhow!("Document has no <head> to inject styles into"))?;

    let style = new_element("style", &[("type", "text/css")]);
    style.append(NodeRef::new_text(css_text));
    head.as_node().append(style);
    Ok(())
}

/// Set an attribute on an element node. No-op for non-element nodes.
pub fn set_attribute(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

/// Read an attribute from an element node.
pub fn get_attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|element| element.attributes.borrow().get(name).map(str::to_string))
}

/// Decoded plain text of a node and its descendants.
///
/// Inline markup is flattened; character entities were already decoded at
/// parse time (e.g. `&nbsp;` is U+00A0 here).
pub fn plain_text(node: &NodeRef) -> String {
    node.text_contents()
}
