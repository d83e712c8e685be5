//! The evaluation engine for running a compiled [`PathExpr`] against any [`TreeNode`].
//!
//! Evaluation walks the tree once, in preorder. Every visited node carries the
//! frontier of segment positions that are still live at that node: a step
//! segment advances when the node's name passes it, `**` stays live while
//! descending (and also lets the next segment start on the same node), and
//! filter segments advance when the node itself passes them. A node is yielded
//! when the end of the expression is in its frontier; a subtree is skipped as
//! soon as its frontier empties. Each node is visited once, so results come out
//! in preorder without duplicates.

use crate::ast::{PathExpr, Segment};
use arbor_node::{Attrs, TreeNode};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::rc::Rc;

type Frontier = Rc<[usize]>;

/// Lazily evaluates `expr` over the tree rooted at `root`.
pub fn evaluate<'a, 'e, N: TreeNode<'a>>(root: N, expr: &'e PathExpr) -> Matches<'a, 'e, N> {
    let start = settle(expr.segments(), BTreeSet::from([0]), None);
    Matches {
        expr,
        stack: vec![(root, start)],
        _marker: PhantomData,
    }
}

/// The nodes matched by a path expression, in preorder.
pub struct Matches<'a, 'e, N> {
    expr: &'e PathExpr,
    // Each pending node with the frontier of its parent.
    stack: Vec<(N, Frontier)>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: TreeNode<'a>> Iterator for Matches<'a, '_, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let segments = self.expr.segments();
        while let Some((node, parent_frontier)) = self.stack.pop() {
            let consumed = consume(segments, &parent_frontier, node.name());
            if consumed.is_empty() {
                continue;
            }
            let frontier = settle(segments, consumed, Some(node.attrs()));
            if frontier.iter().any(|&p| p < segments.len()) {
                let children: Vec<N> = node.children().collect();
                self.stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .map(|child| (child, Rc::clone(&frontier))),
                );
            }
            if frontier.contains(&segments.len()) {
                return Some(node);
            }
        }
        None
    }
}

impl PathExpr {
    /// Tests a single node by running the expression along its ancestor chain.
    pub fn matches<'a, N: TreeNode<'a>>(&self, node: &N) -> bool {
        let mut chain: Vec<N> = node.ancestors().collect();
        chain.reverse();
        chain.push(node.clone());

        let segments = self.segments();
        let mut frontier = settle(segments, BTreeSet::from([0]), None);
        for n in &chain {
            let consumed = consume(segments, &frontier, n.name());
            if consumed.is_empty() {
                return false;
            }
            frontier = settle(segments, consumed, Some(n.attrs()));
        }
        frontier.contains(&segments.len())
    }
}

/// Positions reached by consuming one node named `name` from `frontier`.
fn consume(segments: &[Segment], frontier: &[usize], name: &str) -> BTreeSet<usize> {
    let mut next = BTreeSet::new();
    for &p in frontier {
        match segments.get(p) {
            Some(Segment::WildcardDeep) => {
                next.insert(p);
            }
            Some(seg) if seg.is_step() && seg.matches_name(name) => {
                next.insert(p + 1);
            }
            _ => {}
        }
    }
    next
}

/// Closes `consumed` over the moves that stay on the current node: `**`
/// matching zero further levels, and filters the node passes. `attrs` is
/// `None` above the root, where no filter can pass.
fn settle(segments: &[Segment], consumed: BTreeSet<usize>, attrs: Option<&Attrs>) -> Frontier {
    let mut reached = BTreeSet::new();
    let mut pending: Vec<usize> = consumed.into_iter().collect();
    while let Some(p) = pending.pop() {
        if !reached.insert(p) {
            continue;
        }
        match segments.get(p) {
            Some(Segment::WildcardDeep) => pending.push(p + 1),
            Some(seg) if seg.is_filter() => {
                if attrs.is_some_and(|a| seg.matches_attrs(a)) {
                    pending.push(p + 1);
                }
            }
            _ => {}
        }
    }
    log::trace!("frontier settled at {:?}", reached);
    reached.into_iter().collect()
}
