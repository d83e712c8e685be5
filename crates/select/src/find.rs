//! Searching a tree with a selector.
use crate::selector::Selector;
use arbor_node::{Preorder, TreeNode};

/// Every node under `root` (inclusive) matching `selector`, lazily in preorder.
pub fn find_all<'a, 's, N: TreeNode<'a>>(root: N, selector: &'s Selector) -> FindAll<'a, 's, N> {
    FindAll {
        walk: root.preorder(),
        selector,
    }
}

/// The first node in preorder matching `selector`.
pub fn find<'a, N: TreeNode<'a>>(root: N, selector: &Selector) -> Option<N> {
    find_all(root, selector).next()
}

pub struct FindAll<'a, 's, N> {
    walk: Preorder<'a, N>,
    selector: &'s Selector,
}

impl<'a, N: TreeNode<'a>> Iterator for FindAll<'a, '_, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let selector = self.selector;
        self.walk.find(|node| selector.matches(node))
    }
}
