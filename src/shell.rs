use anyhow::Result;
use async_trait::async_trait;
use kuchikikiki::NodeRef;
use log::debug;

use crate::app_config::Geometry;
use crate::document;
use crate::proxy::ProxiedPage;

// @module: Presentation shell interface (external collaborator)

/// Window, dialog and layout surface consumed by the reader core.
///
/// The shell owns everything visual: mounting the proxied page, styling,
/// visibility toggling, scrolling and element layout. The trait is not
/// `Send` — the document tree it hands out is reference-counted and the
/// reader drives it on one cooperative task.
#[async_trait(?Send)]
pub trait PresentationShell {
    /// Mount the proxied page and resolve once the embedded content has
    /// finished loading.
    async fn mount(&self, page: &ProxiedPage) -> Result<NodeRef>;

    /// Inject a CSS rule into the mounted document.
    fn inject_style_rule(&self, document: &NodeRef, css_text: &str) -> Result<()>;

    /// Show the reading window sized and placed per the configured geometry.
    fn show_reader(&self, geometry: &Geometry);

    fn hide_reader(&self);

    fn show_dialog(&self, message: &str);

    fn hide_dialog(&self);

    /// Scroll the reading window to absolute page coordinates.
    fn scroll_to(&self, x: f64, y: f64);

    /// Layout offset of an element relative to its offset parent, if the
    /// shell knows it. Elements without layout contribute nothing to the
    /// scroll position.
    fn element_offset(&self, node: &NodeRef) -> Option<(f64, f64)>;
}

/// Absolute page position of a node: the ancestor chain is walked from the
/// node to the document root, summing the per-element offsets the shell
/// reports. This yields page coordinates, not viewport-relative ones.
pub fn page_offset(shell: &dyn PresentationShell, node: &NodeRef) -> (f64, f64) {
    let mut x = 0.0;
    let mut y = 0.0;
    let mut cursor = Some(node.clone());
    while let Some(current) = cursor {
        if current.as_element().is_some() {
            if let Some((dx, dy)) = shell.element_offset(&current) {
                x += dx;
                y += dy;
            }
        }
        cursor = current.parent();
    }
    (x, y)
}

/// Shell without a display: parses the page body directly and ignores
/// presentation calls. Used by the CLI and tests.
pub struct HeadlessShell;

#[async_trait(?Send)]
impl PresentationShell for HeadlessShell {
    async fn mount(&self, page: &ProxiedPage) -> Result<NodeRef> {
        Ok(document::parse_html(&page.html))
    }

    fn inject_style_rule(&self, document: &NodeRef, css_text: &str) -> Result<()> {
        document::inject_style_rule(document, css_text)
    }

    fn show_reader(&self, _geometry: &Geometry) {}

    fn hide_reader(&self) {}

    fn show_dialog(&self, message: &str) {
        debug!("{}", message);
    }

    fn hide_dialog(&self) {}

    fn scroll_to(&self, _x: f64, _y: f64) {}

    fn element_offset(&self, _node: &NodeRef) -> Option<(f64, f64)> {
        None
    }
}
