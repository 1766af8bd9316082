use slotmap::SecondaryMap;

use super::{Handle, LayoutError, NodeInfo, NodeKind, NodeTemplate};
use crate::model::tree::{NodeId, NodeMap, Observer, OwnedNode, Tree};

/// Per-node payload kept beside the structural tree.
#[derive(Default)]
pub(crate) struct Components {
    info: SecondaryMap<NodeId, NodeInfo>,
}

impl Observer for Components {
    fn added_to_forest(&mut self, _map: &NodeMap, node: NodeId) {
        self.info.insert(node, NodeInfo::default());
    }

    fn added_to_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removing_from_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn copied(&mut self, _map: &NodeMap, src: NodeId, dest: NodeId) {
        if let Some(info) = self.info.get(src).cloned() {
            self.info.insert(dest, info);
        }
    }

    fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) { self.info.remove(node); }
}

/// The layout of one workspace.
///
/// The root is always a branch or a fallback. Engine operations live in the
/// sibling modules (`placement`, `removal`, `sizing`, `navigation`,
/// `positioning`) as further `impl LayoutTree` blocks.
pub struct LayoutTree {
    pub(super) tree: Tree<Components>,
    root: OwnedNode,
}

impl LayoutTree {
    pub fn from_template(template: &NodeTemplate) -> Result<Self, LayoutError> {
        let issues = template.validate();
        if !issues.is_empty() {
            return Err(LayoutError::InvalidTemplate(issues.join("; ")));
        }
        let mut tree = Tree::with_observer(Components::default());
        let root = build(&mut tree, template, None);
        Ok(LayoutTree {
            tree,
            root: OwnedNode::own(root, "layout root"),
        })
    }

    pub fn root(&self) -> NodeId { self.root.id() }

    pub fn map(&self) -> &NodeMap { &self.tree.map }

    /// Node data, or `None` once the node has been removed.
    pub fn get(&self, node: NodeId) -> Option<&NodeInfo> { self.tree.data.info.get(node) }

    pub(crate) fn info(&self, node: NodeId) -> &NodeInfo { &self.tree.data.info[node] }

    pub(super) fn info_mut(&mut self, node: NodeId) -> &mut NodeInfo {
        &mut self.tree.data.info[node]
    }

    pub(crate) fn kind(&self, node: NodeId) -> &NodeKind { &self.info(node).kind }

    pub(crate) fn children(&self, node: NodeId) -> Vec<NodeId> {
        node.children(&self.tree.map).collect()
    }

    /// Children in ascending priority. Ties keep array order.
    pub fn children_by_priority(&self, node: NodeId) -> Vec<NodeId> {
        let mut children = self.children(node);
        children.sort_by_key(|&c| self.info(c).priority);
        children
    }

    pub fn non_empty_children(&self, node: NodeId) -> Vec<NodeId> {
        node.children(&self.tree.map).filter(|&c| !self.is_empty(c)).collect()
    }

    pub fn is_empty(&self, node: NodeId) -> bool {
        match self.kind(node) {
            NodeKind::Branch(_) => node.children(&self.tree.map).all(|c| self.is_empty(c)),
            kind => kind.handles().is_empty(),
        }
    }

    pub fn is_full(&self, node: NodeId) -> bool {
        match self.kind(node) {
            NodeKind::Leaf { handle } => handle.is_some(),
            NodeKind::Fallback { .. } => false,
            NodeKind::Branch(_) => node.children(&self.tree.map).all(|c| self.is_full(c)),
        }
    }

    /// Number of handles held anywhere below `node`.
    pub fn length(&self, node: NodeId) -> usize {
        node.traverse_preorder(&self.tree.map).map(|n| self.kind(n).handles().len()).sum()
    }

    pub fn node_containing(&self, handle: Handle) -> Option<NodeId> {
        self.root().traverse_preorder(&self.tree.map).find(|&n| self.kind(n).holds(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool { self.node_containing(handle).is_some() }

    /// Every handle in the tree, in tree order.
    pub fn handles(&self) -> Vec<Handle> {
        self.root()
            .traverse_preorder(&self.tree.map)
            .flat_map(|n| self.kind(n).handles().iter().copied())
            .collect()
    }

    pub fn draw_tree(&self) -> String {
        let tree = self.ascii_tree(self.root());
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let info = self.info(node);
        let contents = match &info.kind {
            NodeKind::Leaf { handle: Some(h) } => format!("leaf {h}"),
            NodeKind::Leaf { handle: None } => "leaf -".to_owned(),
            NodeKind::Fallback { handles, active } => {
                let members: Vec<_> = handles
                    .iter()
                    .map(|h| if Some(*h) == *active { format!("*{h}") } else { h.to_string() })
                    .collect();
                format!("fallback [{}]", members.join(", "))
            }
            NodeKind::Branch(orientation) => orientation.to_string(),
        };
        let mut desc = format!(
            "{contents} ({}, p={}, g={})",
            info.subtype, info.priority, info.grow_factor
        );
        if let Some(condition) = &info.condition {
            desc.push_str(&format!(" if {condition}"));
        }
        let children: Vec<_> =
            node.children(&self.tree.map).map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }
}

fn build(tree: &mut Tree<Components>, template: &NodeTemplate, parent: Option<NodeId>) -> NodeId {
    let node = match parent {
        Some(parent) => tree.mk_node().push_back(parent),
        None => tree.mk_node().into_id(),
    };
    tree.data.info.insert(node, template.info());
    for child in &template.children {
        build(tree, child, Some(node));
    }
    node
}

impl Drop for LayoutTree {
    fn drop(&mut self) { self.root.remove(&mut self.tree); }
}

impl std::fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.draw_tree())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::{Orientation, Subtype};

    fn fibonacci() -> LayoutTree { LayoutTree::from_template(&NodeTemplate::fibonacci()).unwrap() }

    #[test]
    fn builds_from_template() {
        let tree = fibonacci();
        let root = tree.root();
        assert_eq!(tree.kind(root), &NodeKind::Branch(Orientation::Horizontal));
        let children = tree.children(root);
        assert_eq!(children.len(), 2);
        assert!(tree.kind(children[0]).is_leaf());
        assert_eq!(tree.info(children[1]).priority, 2);
        assert_eq!(tree.info(children[1]).subtype, Subtype::Permanent);
        assert_eq!(tree.map().len(), 7);
    }

    #[test]
    fn rejects_leaf_root() {
        let result = LayoutTree::from_template(&NodeTemplate::leaf(1));
        assert!(matches!(result, Err(LayoutError::InvalidTemplate(_))));
    }

    #[test]
    fn empty_tree_queries() {
        let tree = fibonacci();
        assert!(tree.is_empty(tree.root()));
        assert!(!tree.is_full(tree.root()));
        assert_eq!(tree.length(tree.root()), 0);
        assert_eq!(tree.node_containing(Handle(1)), None);
        assert!(tree.handles().is_empty());
    }

    #[test]
    fn children_by_priority_is_stable() {
        let template = NodeTemplate::branch(Orientation::Horizontal, 1, vec![
            NodeTemplate::leaf(2),
            NodeTemplate::leaf(1),
            NodeTemplate::leaf(2),
            NodeTemplate::leaf(1),
        ]);
        let tree = LayoutTree::from_template(&template).unwrap();
        let children = tree.children(tree.root());
        assert_eq!(tree.children_by_priority(tree.root()), vec![
            children[1],
            children[3],
            children[0],
            children[2],
        ]);
    }

    #[test]
    fn draw_tree_lists_every_node() {
        let tree = fibonacci();
        let drawn = tree.draw_tree();
        assert_eq!(drawn.lines().count(), 7, "{drawn}");
        assert!(drawn.contains("horizontal (permanent, p=1, g=1)"));
        assert!(drawn.contains("fallback []"));
    }

    #[test]
    fn get_returns_none_for_removed_node() {
        let mut tree = fibonacci();
        let slot = tree.children(tree.root())[0];
        assert_eq!(tree.get(slot).map(|info| info.priority), Some(1));
        slot.detach(&mut tree.tree).remove();
        assert!(tree.get(slot).is_none());
    }
}
