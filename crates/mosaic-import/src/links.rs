//! Anchor link resolution: fragment hrefs become in-document navigation.

use std::collections::HashMap;

use tracing::debug;

use mosaic_scene::{Interaction, SceneDocument, SceneNodeId};

/// Attach `NavigateTo` interactions for every anchor whose href names a
/// node in this document. External and unresolvable hrefs are dropped.
pub fn resolve_links(
    doc: &mut SceneDocument,
    identity: &HashMap<String, SceneNodeId>,
    anchors: &[(SceneNodeId, String)],
) {
    for (anchor, href) in anchors {
        let Some(fragment) = fragment_of(href) else {
            continue;
        };
        let target = identity
            .get(fragment)
            .cloned()
            .or_else(|| find_by_name(doc, fragment));
        let Some(target) = target else {
            debug!(%href, "anchor fragment has no matching node");
            continue;
        };
        if target == *anchor {
            continue;
        }
        if let Some(node) = doc.node_mut(anchor) {
            node.interaction = Some(Interaction::NavigateTo { target });
        }
    }
}

/// The fragment of an in-page href: `#section`, or a full URL whose
/// fragment is set. Hrefs without a fragment are external navigation.
fn fragment_of(href: &str) -> Option<&str> {
    let trimmed = href.trim();
    if let Some(fragment) = trimmed.strip_prefix('#') {
        return (!fragment.is_empty()).then_some(fragment);
    }
    if let Ok(parsed) = url::Url::parse(trimmed) {
        if let Some(fragment) = parsed.fragment() {
            if !fragment.is_empty() {
                if let Some(position) = trimmed.rfind('#') {
                    return Some(&trimmed[position + 1..]);
                }
            }
        }
    }
    None
}

fn find_by_name(doc: &SceneDocument, name: &str) -> Option<SceneNodeId> {
    doc.nodes
        .iter()
        .find(|node| node.name == name)
        .map(|node| node.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_scene::{FrameSpec, SceneNode, SceneNodeKind, TextRunSpec};

    fn doc_with(nodes: Vec<SceneNode>) -> SceneDocument {
        SceneDocument {
            root: nodes[0].id.clone(),
            nodes,
            text_styles: Vec::new(),
            color_styles: Vec::new(),
        }
    }

    fn frame(id: &str, name: &str) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            name: name.to_string(),
            source_id: None,
            interaction: None,
            kind: SceneNodeKind::Frame(FrameSpec::default()),
        }
    }

    fn run(id: &str) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            name: "a".to_string(),
            source_id: None,
            interaction: None,
            kind: SceneNodeKind::TextRun(TextRunSpec {
                text: "go".to_string(),
                font: None,
                font_size: None,
                underline: true,
                fills: Vec::new(),
                text_style_ref: None,
                color_style_ref: None,
            }),
        }
    }

    #[test]
    fn fragment_href_resolves_through_identity() {
        let mut doc = doc_with(vec![frame("node0001", "section"), run("node0002")]);
        let identity = HashMap::from([("intro".to_string(), "node0001".to_string())]);
        let anchors = vec![("node0002".to_string(), "#intro".to_string())];
        resolve_links(&mut doc, &identity, &anchors);
        assert!(matches!(
            doc.node("node0002").unwrap().interaction,
            Some(Interaction::NavigateTo { ref target }) if target == "node0001"
        ));
    }

    #[test]
    fn unresolvable_and_external_hrefs_are_dropped() {
        let mut doc = doc_with(vec![frame("node0001", "page"), run("node0002")]);
        let anchors = vec![
            ("node0002".to_string(), "#missing".to_string()),
            ("node0002".to_string(), "https://example.com/path".to_string()),
        ];
        resolve_links(&mut doc, &HashMap::new(), &anchors);
        assert!(doc.node("node0002").unwrap().interaction.is_none());
    }

    #[test]
    fn fragment_falls_back_to_node_name() {
        let mut doc = doc_with(vec![frame("node0001", "pricing"), run("node0002")]);
        let anchors = vec![("node0002".to_string(), "#pricing".to_string())];
        resolve_links(&mut doc, &HashMap::new(), &anchors);
        assert!(doc.node("node0002").unwrap().interaction.is_some());
    }
}
