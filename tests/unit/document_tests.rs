/*!
 * Tests for the HTML document tree wrappers
 */

use anyhow::Result;
use pagereader::document;

/// Test parsing and selecting over a simple page
#[test]
fn test_parse_html_withSimplePage_shouldBuildSelectableTree() {
    let tree = document::parse_html("<html><body><p>Hello.</p></body></html>");
    let paragraph = tree.select_first("p").expect("paragraph should exist");
    assert_eq!(paragraph.as_node().text_contents(), "Hello.");
}

/// Test that the parser synthesizes the missing document skeleton
#[test]
fn test_parse_html_withBareFragment_shouldSynthesizeSkeleton() {
    let tree = document::parse_html("<p>Just a fragment.</p>");
    assert!(tree.select_first("html").is_ok());
    assert!(tree.select_first("head").is_ok());
    assert!(tree.select_first("body").is_ok());
}

/// Test creating a detached element with attributes
#[test]
fn test_new_element_withAttributes_shouldCarryThem() {
    let span = document::new_element("span", &[("class", "wrapped-sentence"), ("id", "s0")]);
    assert_eq!(
        document::get_attribute(&span, "class").as_deref(),
        Some("wrapped-sentence")
    );
    assert_eq!(document::get_attribute(&span, "id").as_deref(), Some("s0"));
}

/// Test injecting a style rule into the document head
#[test]
fn test_inject_style_rule_withValidDocument_shouldAppendStyleToHead() -> Result<()> {
    let tree = document::parse_html("<html><head></head><body></body></html>");
    let rule = "span.highlight {background-color:red;}";

    document::inject_style_rule(&tree, rule)?;

    let style = tree.select_first("head style").expect("style should exist");
    assert_eq!(style.as_node().text_contents(), rule);
    assert_eq!(
        document::get_attribute(style.as_node(), "type").as_deref(),
        Some("text/css")
    );
    Ok(())
}

/// Test attribute set/get round trip and overwrite
#[test]
fn test_set_attribute_withExistingAttribute_shouldOverwrite() {
    let tree = document::parse_html("<html><body><span class=\"a\">x</span></body></html>");
    let span = tree.select_first("span").unwrap().as_node().clone();

    assert_eq!(document::get_attribute(&span, "class").as_deref(), Some("a"));
    document::set_attribute(&span, "class", "b");
    assert_eq!(document::get_attribute(&span, "class").as_deref(), Some("b"));
}

/// Test that attribute operations on non-element nodes are harmless
#[test]
fn test_set_attribute_withTextNode_shouldBeNoOp() {
    let tree = document::parse_html("<html><body><p>text only</p></body></html>");
    let paragraph = tree.select_first("p").unwrap().as_node().clone();
    let text_node = paragraph.first_child().expect("text child should exist");

    document::set_attribute(&text_node, "class", "ignored");
    assert_eq!(document::get_attribute(&text_node, "class"), None);
}

/// Test that plain text decodes entities and flattens inline markup
#[test]
fn test_plain_text_withEntitiesAndInlineMarkup_shouldDecodeAndFlatten() {
    let tree = document::parse_html(
        "<html><body><p>Fish&nbsp;&amp; <b>chips</b>.</p></body></html>",
    );
    let paragraph = tree.select_first("p").unwrap().as_node().clone();
    assert_eq!(document::plain_text(&paragraph), "Fish\u{a0}& chips.");
}
