use std::ops::Index;

use slotmap::SlotMap;

/// N-ary tree stored in an arena.
///
/// Structure lives in [`NodeMap`]; anything attached to a node (payloads,
/// indexes) lives in the observer `O`, which is told about every structural
/// change.
pub struct Tree<O> {
    pub map: NodeMap,
    pub data: O,
}

impl<O: Observer> Tree<O> {
    pub fn with_observer(data: O) -> Self { Tree { map: NodeMap::new(), data } }

    pub fn mk_node(&mut self) -> UnattachedNode<'_, O> {
        let id = self.map.map.insert(Node::default());
        self.data.added_to_forest(&self.map, id);
        UnattachedNode { id, tree: self }
    }
}

/// Map that holds the structure of the tree.
///
/// Multiple roots can live in one map, which is how detached subtrees are
/// built up before being linked into place.
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

impl NodeMap {
    fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

/// Represents ownership of a root node.
///
/// Roots must be removed manually, because removal requires a reference to
/// the tree. Dropping an `OwnedNode` that still holds a node panics in debug
/// builds; the name is used in the panic message.
#[must_use]
#[derive(Debug)]
pub struct OwnedNode(Option<NodeId>, String);

impl OwnedNode {
    /// Marks an existing unattached node as an owned root.
    pub fn own(node: NodeId, name: &'static str) -> Self { OwnedNode(Some(node), name.to_owned()) }

    pub fn id(&self) -> NodeId { self.0.expect("OwnedNode::id called on removed OwnedNode") }

    #[track_caller]
    pub fn remove(&mut self, tree: &mut Tree<impl Observer>) {
        if let Some(id) = self.0.take() {
            UnattachedNode { id, tree }.remove()
        }
    }
}

impl Drop for OwnedNode {
    fn drop(&mut self) {
        if cfg!(debug_assertions)
            && !std::thread::panicking()
            && let Some(node) = self.0
        {
            panic!(
                "OwnedNode {name:?} dropped without OwnedNode::remove being called: {node:?}",
                name = self.1,
            );
        }
    }
}

slotmap::new_key_type! {
    /// Represents a node somewhere in the tree.
    pub struct NodeId;
}

#[derive(Default, Clone, PartialEq, Debug)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeId {
    #[track_caller]
    pub fn detach<O: Observer>(self, tree: &mut Tree<O>) -> DetachedNode<'_, O> {
        DetachedNode { id: self, tree }
    }

    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    pub fn children(self, map: &NodeMap) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        map.map.get(self).map(|n| n.children.as_slice()).unwrap_or_default().iter().copied()
    }

    pub fn child_count(self, map: &NodeMap) -> usize {
        map.map.get(self).map(|n| n.children.len()).unwrap_or(0)
    }

    pub fn child_at(self, map: &NodeMap, index: usize) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.children.get(index).copied())
    }

    /// Position of this node among its parent's children.
    pub fn index_in_parent(self, map: &NodeMap) -> Option<usize> {
        let parent = self.parent(map)?;
        map.map.get(parent)?.children.iter().position(|&c| c == self)
    }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal { stack: vec![self], map }
    }

    /// Creates a deep copy of the subtree rooted at this node.
    ///
    /// The observer sees `added_to_forest`, then `copied`, then
    /// `added_to_parent` (except for the new root) for every created node.
    pub fn deep_copy<O: Observer>(self, tree: &mut Tree<O>) -> UnattachedNode<'_, O> {
        let id = copy_subtree(tree, self);
        UnattachedNode { id, tree }
    }

    fn link_under(self, parent: NodeId, index: Option<usize>, map: &mut NodeMap) -> bool {
        if self == parent || !map.contains(self) || !map.contains(parent) {
            return false;
        }
        debug_assert_eq!(map.map[self].parent, None, "linking a node that is still attached");
        let siblings = &mut map.map[parent].children;
        let index = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, self);
        map.map[self].parent = Some(parent);
        true
    }
}

fn copy_subtree<O: Observer>(tree: &mut Tree<O>, src: NodeId) -> NodeId {
    let dest = tree.mk_node().id;
    tree.data.copied(&tree.map, src, dest);
    let children: Vec<_> = src.children(&tree.map).collect();
    for child in children {
        let copied = copy_subtree(tree, child);
        if copied.link_under(dest, None, &mut tree.map) {
            tree.data.added_to_parent(&tree.map, copied);
        }
    }
    dest
}

fn delete_recursive<O: Observer>(tree: &mut Tree<O>, id: NodeId) {
    if !tree.map.contains(id) {
        return;
    }
    tree.data.removed_from_forest(&tree.map, id);
    if let Some(node) = tree.map.map.remove(id) {
        for child in node.children {
            delete_recursive(tree, child);
        }
    }
}

impl NodeMap {
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.map.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.map.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.map.get_mut(id) {
            node.parent = None;
        }
    }
}

pub trait Observer
where Self: Sized {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId);
    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId);
    fn copied(&mut self, map: &NodeMap, src: NodeId, dest: NodeId);
    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId);
}

#[must_use = "Unattached nodes should be inserted into the tree or owned as a root"]
pub struct UnattachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> UnattachedNode<'a, O> {
    /// Gives up the guard; the node stays in the forest as a root until it
    /// is attached or removed.
    pub fn into_id(self) -> NodeId { self.id }

    pub fn push_back(self, parent: NodeId) -> NodeId { self.attach(parent, None) }

    pub fn push_front(self, parent: NodeId) -> NodeId { self.attach(parent, Some(0)) }

    pub fn remove(self) {
        debug_assert!(self.id.parent(&self.tree.map).is_none());
        delete_recursive(self.tree, self.id);
    }

    fn attach(self, parent: NodeId, index: Option<usize>) -> NodeId {
        if self.id.link_under(parent, index, &mut self.tree.map) {
            self.tree.data.added_to_parent(&self.tree.map, self.id);
        }
        self.id
    }
}

#[must_use = "Detached nodes should be removed"]
pub struct DetachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> DetachedNode<'a, O> {
    /// Unlinks the node and deletes it together with its subtree.
    pub fn remove(self) {
        if self.id.parent(&self.tree.map).is_some() {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
            self.tree.map.unlink(self.id);
        }
        delete_recursive(self.tree, self.id);
    }
}

struct PreorderTraversal<'a> {
    stack: Vec<NodeId>,
    map: &'a NodeMap,
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children(self.map).rev());
        Some(node)
    }
}


#[cfg(test)]
mod tests {
    use std::iter;

    use super::*;

    /// A tree with the following structure:
    /// ```text
    ///         [tree]              [other_tree]
    ///        __root__              other_root
    ///       /    |   \
    /// child1  child2  child3
    ///            |
    ///           gc1
    /// ```
    struct TestTree {
        tree: Tree<Events>,
        root_node: OwnedNode,
        root: NodeId,
        child1: NodeId,
        child2: NodeId,
        child3: NodeId,
        gc1: NodeId,
        other_root_node: OwnedNode,
        other_root: NodeId,
    }

    impl Drop for TestTree {
        fn drop(&mut self) {
            self.root_node.remove(&mut self.tree);
            self.other_root_node.remove(&mut self.tree);
        }
    }

    impl TestTree {
        #[rustfmt::skip]
        fn new() -> Self {
            let mut tree = Tree::with_observer(Events(vec![]));

            let root = tree.mk_node().into_id();
            let root_node = OwnedNode::own(root, "tree");
            let child1 = tree.mk_node().push_back(root);
            let child2 = tree.mk_node().push_back(root);
            let child3 = tree.mk_node().push_back(root);

            let gc1 = tree.mk_node().push_back(child2);
            let other_root = tree.mk_node().into_id();
            let other_root_node = OwnedNode::own(other_root, "other_tree");

            let mut t = TestTree {
                tree, root_node, root,
                child1, child2, child3, gc1,
                other_root_node, other_root,
            };
            t.tree.data.0.clear();
            t
        }

        fn get_children(&self, node: NodeId) -> Vec<NodeId> {
            node.children(&self.tree.map).collect()
        }

        #[track_caller]
        fn assert_children_are<const N: usize>(&self, children: [NodeId; N], parent: NodeId) {
            assert_eq!(children.as_slice(), self.get_children(parent), "children did not match");
            for child in self.get_children(parent) {
                assert_eq!(
                    child.parent(&self.tree.map),
                    Some(parent),
                    "child has incorrect parent"
                );
            }
        }

        #[track_caller]
        fn assert_events_are<const N: usize>(&mut self, events: [TreeEvent; N]) {
            let actual: Vec<_> = self.tree.data.0.drain(..).collect();
            pretty_assertions::assert_eq!(events.as_slice(), actual);
        }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum TreeEvent {
        AddedToForest(NodeId),
        AddedToParent(NodeId),
        RemovingFromParent(NodeId, NodeId),
        Copied(NodeId, NodeId),
        RemovedFromForest(NodeId),
    }
    use TreeEvent::*;

    struct Events(Vec<TreeEvent>);

    impl Observer for Events {
        fn added_to_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToForest(node))
        }

        fn added_to_parent(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToParent(node))
        }

        fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
            let parent = node.parent(map).expect("removing a node without a parent");
            self.0.push(RemovingFromParent(node, parent))
        }

        fn copied(&mut self, _map: &NodeMap, src: NodeId, dest: NodeId) {
            self.0.push(Copied(src, dest))
        }

        fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(RemovedFromForest(node))
        }
    }

    #[test]
    fn iterator() {
        let t = TestTree::new();
        assert_eq!([t.child1, t.child2, t.child3], *t.get_children(t.root));
        assert!(t.get_children(t.child1).is_empty());
        assert_eq!([t.gc1], *t.get_children(t.child2));
        assert!(t.get_children(t.other_root).is_empty());
    }

    #[test]
    fn indices() {
        let t = TestTree::new();
        let map = &t.tree.map;
        assert_eq!(t.child2.index_in_parent(map), Some(1));
        assert_eq!(t.root.index_in_parent(map), None);
        assert_eq!(t.root.child_at(map, 0), Some(t.child1));
        assert_eq!(t.root.child_at(map, 2), Some(t.child3));
        assert_eq!(t.root.child_at(map, 3), None);
        assert_eq!(t.root.child_count(map), 3);
        assert_eq!(t.child1.child_count(map), 0);
    }

    #[test]
    fn ancestors() {
        let t = TestTree::new();
        let ancestors = |node: NodeId| node.ancestors(&t.tree.map).collect::<Vec<_>>();
        assert_eq!([t.child1, t.root], *ancestors(t.child1));
        assert_eq!([t.gc1, t.child2, t.root], *ancestors(t.gc1));
        assert_eq!([t.root], *ancestors(t.root));
        assert_eq!([t.other_root], *ancestors(t.other_root));
    }

    #[test]
    fn traverse_preorder() {
        let t = TestTree::new();
        let traverse = |node: NodeId| node.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!([t.root, t.child1, t.child2, t.gc1, t.child3], *traverse(t.root));
        assert_eq!([t.child1], *traverse(t.child1));
    }

    #[test]
    fn deep_copy() {
        let mut t = TestTree::new();
        let copied = t.child2.deep_copy(&mut t.tree).into_id();
        let mut copied_root = OwnedNode::own(copied, "copy");
        let copied_gc = copied.child_at(&t.tree.map, 0).unwrap();
        t.assert_events_are([
            AddedToForest(copied),
            Copied(t.child2, copied),
            AddedToForest(copied_gc),
            Copied(t.gc1, copied_gc),
            AddedToParent(copied_gc),
        ]);

        let orig_ids = t.child2.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        let copied_ids = copied.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!(orig_ids.len(), copied_ids.len());
        for (orig, copy) in iter::zip(orig_ids, copied_ids) {
            assert_ne!(orig, copy, "deep_copy reused id {orig:?}");
            assert_eq!(orig.child_count(&t.tree.map), copy.child_count(&t.tree.map));
        }
        assert_eq!(copied.parent(&t.tree.map), None);
        copied_root.remove(&mut t.tree);
    }

    #[test]
    fn push_front_and_back() {
        let mut t = TestTree::new();
        let child4 = t.tree.mk_node().push_back(t.root);
        t.assert_events_are([AddedToForest(child4), AddedToParent(child4)]);
        let child0 = t.tree.mk_node().push_front(t.root);
        t.assert_events_are([AddedToForest(child0), AddedToParent(child0)]);
        t.assert_children_are([child0, t.child1, t.child2, t.child3, child4], t.root);
    }

    #[test]
    fn remove() {
        let mut t = TestTree::new();

        t.child2.detach(&mut t.tree).remove();
        t.assert_children_are([t.child1, t.child3], t.root);
        assert!(!t.tree.map.contains(t.child2));
        assert!(!t.tree.map.contains(t.gc1));
        t.assert_events_are([
            RemovingFromParent(t.child2, t.root),
            RemovedFromForest(t.child2),
            RemovedFromForest(t.gc1),
        ]);

        t.child1.detach(&mut t.tree).remove();
        t.child3.detach(&mut t.tree).remove();
        t.assert_children_are([], t.root);
        assert!(t.tree.map.contains(t.root));
    }

    #[test]
    fn node_contains() {
        let t = TestTree::new();
        assert!(t.tree.map.contains(t.root));
        assert!(t.tree.map.contains(t.gc1));
        assert!(!t.tree.map.contains(NodeId::default()));
        assert_eq!(t.tree.map.len(), 6);
    }
}
