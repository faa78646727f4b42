use anyhow::Result;
use kuchikikiki::NodeRef;
use log::{debug, warn};

// @module: Region/tag selection of elements to segment

/// User-supplied hook producing the selector scopes to segment for a URL.
/// Returning `Ok(None)` or an empty list means "parse the whole document".
pub type RegionHook = Box<dyn Fn(&str) -> Result<Option<Vec<String>>>>;

/// One ordered set of elements to segment: a region crossed with a tag name
pub struct ElementGroup {
    /// Selector scope this group was resolved from, `None` for whole-document
    pub region: Option<String>,

    /// Tag name the scope was crossed with
    pub tag: String,

    /// Matching elements, in document order
    pub elements: Vec<NodeRef>,
}

/// Compute the ordered element groups the segmenter should process.
///
/// The region hook's failure is logged and treated as "no constraint"; it is
/// never propagated upward. Regions resolving to zero nodes are skipped
/// silently. Resolved regions are crossed with every tag name, preserving
/// region order then tag order.
pub fn select_regions(
    document: &NodeRef,
    tags: &[String],
    url: &str,
    region_hook: Option<&RegionHook>,
) -> Vec<ElementGroup> {
    let regions = match region_hook {
        Some(hook) => match hook(url) {
            Ok(regions) => regions.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to get regions: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    // Whole-document fallback: one degenerate region crossed with every tag.
    if regions.is_empty() {
        return tags
            .iter()
            .map(|tag| ElementGroup {
                region: None,
                tag: tag.clone(),
                elements: select_all(document, tag),
            })
            .collect();
    }

    let mut groups = Vec::new();
    for region in regions {
        if select_all(document, &region).is_empty() {
            debug!("Region {:?} resolved to no nodes, skipping", region);
            continue;
        }
        for tag in tags {
            let scoped = format!("{} {}", region, tag);
            groups.push(ElementGroup {
                region: Some(region.clone()),
                tag: tag.clone(),
                elements: select_all(document, &scoped),
            });
        }
    }
    groups
}

/// All elements matching a selector, in document order. An invalid selector
/// resolves to no nodes.
fn select_all(document: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match document.select(selector) {
        Ok(matches) => matches.map(|element| element.as_node().clone()).collect(),
        Err(()) => {
            warn!("Invalid selector: {:?}", selector);
            Vec::new()
        }
    }
}
