//! Plain-text outline of one area tree.

use super::forest::ConstructorForest;
use super::links::{LinkResolution, LinkState};
use crate::model::ids::AreaId;
use crate::model::node::NodeRef;

const INDENT: &str = "  ";

/// Renders the tree of `area` as indented lines.
///
/// Holders show their display name and id; links and group references are
/// marked so the outline stays readable without a widget tree.
pub fn render_outline(
    forest: &ConstructorForest,
    links: &LinkResolution,
    area: AreaId,
) -> Vec<String> {
    let mut lines = Vec::new();
    let root = NodeRef::area(area);
    if forest.contains(root) {
        render_node(forest, links, root, 0, &mut lines);
    }
    lines
}

fn render_node(
    forest: &ConstructorForest,
    links: &LinkResolution,
    node: NodeRef,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let label = match node {
        NodeRef::Area { id } => {
            let name = forest.area(id).map(|area| area.name.as_str()).unwrap_or("");
            format!("{name} [{id}]")
        }
        NodeRef::Group { id } => format!("[{id}]"),
        NodeRef::Holder { id } => {
            let name = links.display_name(forest, id);
            match links.state(id) {
                Some(LinkState::Resolved(target)) => format!("{name} ({id} -> {target})"),
                Some(LinkState::Broken(_)) | None => format!("{name} ({id})"),
            }
        }
        NodeRef::GroupRef { target, .. } => format!("=> {target}"),
    };
    lines.push(format!("{}{label}", INDENT.repeat(depth)));
    for child in forest.children(node) {
        render_node(forest, links, child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::render_outline;
    use crate::model::ids::AreaId;
    use crate::tree::forest::fixtures::sample_forest;
    use crate::tree::links::{LinkResolution, DEFAULT_BROKEN_LINK_PLACEHOLDER};

    #[test]
    fn outline_indents_by_depth_and_marks_links() {
        let forest = sample_forest();
        let links = LinkResolution::resolve(&forest, DEFAULT_BROKEN_LINK_PLACEHOLDER);

        let lines = render_outline(&forest, &links, AreaId(1));
        assert_eq!(lines[0], "Home [area#1]");
        assert_eq!(lines[1], "  [group#1]");
        assert_eq!(lines[2], "    A (holder#1)");
        assert!(lines.contains(&"      => group#3".to_string()));
        assert!(lines.contains(&"    C (holder#4 -> holder#3)".to_string()));
        assert!(render_outline(&forest, &links, AreaId(9)).is_empty());
    }
}
