//! Lazy traversal iterators over any [`TreeNode`].
//!
//! Each iterator owns its own stack and is built fresh by every call, so two
//! traversals of the same tree never interfere.

use crate::access::TreeNode;
use std::marker::PhantomData;

pub struct Preorder<'a, N> {
    stack: Vec<N>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: TreeNode<'a>> Preorder<'a, N> {
    pub fn new(start: N) -> Self {
        Self {
            stack: vec![start],
            _marker: PhantomData,
        }
    }
}

impl<'a, N: TreeNode<'a>> Iterator for Preorder<'a, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.stack.pop()?;
        let children: Vec<N> = current.children().collect();
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

pub struct Descendants<'a, N> {
    inner: Preorder<'a, N>,
}

impl<'a, N: TreeNode<'a>> Descendants<'a, N> {
    pub fn new(start: N) -> Self {
        let mut inner = Preorder::new(start);
        inner.next();
        Self { inner }
    }
}

impl<'a, N: TreeNode<'a>> Iterator for Descendants<'a, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        self.inner.next()
    }
}

pub struct Postorder<'a, N> {
    // (node, children already pushed)
    stack: Vec<(N, bool)>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: TreeNode<'a>> Postorder<'a, N> {
    pub fn new(start: N) -> Self {
        Self {
            stack: vec![(start, false)],
            _marker: PhantomData,
        }
    }
}

impl<'a, N: TreeNode<'a>> Iterator for Postorder<'a, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node);
            }
            let children: Vec<N> = node.children().collect();
            self.stack.push((node, true));
            self.stack
                .extend(children.into_iter().rev().map(|c| (c, false)));
        }
    }
}

pub struct Ancestors<'a, N> {
    current: Option<N>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: TreeNode<'a>> Ancestors<'a, N> {
    pub fn new(start: N) -> Self {
        Self {
            current: start.parent(),
            _marker: PhantomData,
        }
    }
}

impl<'a, N: TreeNode<'a>> Iterator for Ancestors<'a, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.current.take()?;
        self.current = current.parent();
        Some(current)
    }
}

/// Selects the order in which a fold visits nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Preorder,
    Postorder,
}

/// Accumulates over every node of the subtree rooted at `start`.
pub fn fold<'a, N, T, F>(start: N, init: T, order: Order, mut combine: F) -> T
where
    N: TreeNode<'a>,
    F: FnMut(T, &N) -> T,
{
    match order {
        Order::Preorder => start.preorder().fold(init, |acc, n| combine(acc, &n)),
        Order::Postorder => start.postorder().fold(init, |acc, n| combine(acc, &n)),
    }
}
