//! Path graph of a body.
//!
//! Every top-level statement gets one node. A guard adds one node for its
//! action, a pipe-match one node per arm, and the body ends in a synthetic
//! `End` node. The node standing for a guard or a match covers only the
//! evaluation of its condition or scrutinee; the branches live in their own
//! nodes.
//!
//! Edges only point forward, so node order is a topological order and a
//! single forward pass visits every predecessor before its successor.

#![forbid(unsafe_code)]

use ail_ast::{Block, MatchArm, Stmt};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind<'a> {
    Stmt(&'a Stmt),
    GuardAction(&'a Stmt),
    Arm(&'a MatchArm),
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Straight-line successor.
    Next,
    /// Guard condition held.
    Taken,
    /// Guard condition failed.
    Fallthrough,
    /// Pipe-match selected arm `i`.
    Arm(usize),
}

#[derive(Clone, Debug)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    pub succs: Vec<(Edge, usize)>,
}

#[derive(Clone, Debug)]
pub struct PathGraph<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> PathGraph<'a> {
    pub fn build(body: &'a Block) -> Self {
        // First node index of each statement, plus the index of `End`.
        let mut starts = Vec::with_capacity(body.stmts.len() + 1);
        let mut next = 0;
        for stmt in &body.stmts {
            starts.push(next);
            next += 1 + match stmt {
                Stmt::Guard(_) => 1,
                Stmt::Match(m) => m.arms.len(),
                _ => 0,
            };
        }
        starts.push(next);

        let mut nodes = Vec::with_capacity(next + 1);
        for (i, stmt) in body.stmts.iter().enumerate() {
            let here = starts[i];
            let after = starts[i + 1];
            match stmt {
                Stmt::Guard(g) => {
                    nodes.push(Node {
                        kind: NodeKind::Stmt(stmt),
                        succs: vec![(Edge::Taken, here + 1), (Edge::Fallthrough, after)],
                    });
                    nodes.push(Node {
                        kind: NodeKind::GuardAction(&g.action),
                        succs: continuation(&g.action, after),
                    });
                }
                Stmt::Match(m) => {
                    nodes.push(Node {
                        kind: NodeKind::Stmt(stmt),
                        succs: (0..m.arms.len())
                            .map(|a| (Edge::Arm(a), here + 1 + a))
                            .collect(),
                    });
                    for arm in &m.arms {
                        nodes.push(Node {
                            kind: NodeKind::Arm(arm),
                            succs: continuation(&arm.action, after),
                        });
                    }
                }
                _ => nodes.push(Node {
                    kind: NodeKind::Stmt(stmt),
                    succs: continuation(stmt, after),
                }),
            }
        }
        nodes.push(Node {
            kind: NodeKind::End,
            succs: Vec::new(),
        });

        trace!(
            stmts = body.stmts.len(),
            nodes = nodes.len(),
            "built path graph"
        );
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, i: usize) -> &Node<'a> {
        &self.nodes[i]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node<'a>)> {
        self.nodes.iter().enumerate()
    }

    pub fn end(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn predecessors(&self) -> Vec<Vec<usize>> {
        let mut preds = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for &(_, to) in &node.succs {
                preds[to].push(i);
            }
        }
        preds
    }

    /// Nodes reachable from the entry.
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        seen[0] = true;
        for i in 0..self.nodes.len() {
            if !seen[i] {
                continue;
            }
            for &(_, to) in &self.nodes[i].succs {
                seen[to] = true;
            }
        }
        seen
    }

    /// True when some path falls off the end of the body.
    pub fn end_reachable(&self) -> bool {
        self.reachable()[self.end()]
    }
}

fn continuation(stmt: &Stmt, after: usize) -> Vec<(Edge, usize)> {
    if stmt.is_terminator() {
        Vec::new()
    } else {
        vec![(Edge::Next, after)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ail_ast::{Decl, Program};

    fn body(src: &str) -> Block {
        let program: Program = ail_parse::parse_source(src).expect("parse");
        match program.decls.into_iter().next() {
            Some(Decl::Fn(f)) => f.body,
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn straight_line_ends_in_end_node() {
        let b = body("fn f():i32 =\n  x:i32 = 1\n  ^x\n");
        let g = PathGraph::build(&b);
        assert_eq!(g.len(), 3);
        assert_eq!(g.node(0).succs, vec![(Edge::Next, 1)]);
        assert!(g.node(1).succs.is_empty());
        assert!(!g.end_reachable());
    }

    #[test]
    fn guard_splits_into_taken_and_fallthrough() {
        let b = body("fn f(b:bool):i32 =\n  b ? ^1\n  ^2\n");
        let g = PathGraph::build(&b);
        assert_eq!(g.node(0).succs, vec![(Edge::Taken, 1), (Edge::Fallthrough, 2)]);
        assert!(matches!(g.node(1).kind, NodeKind::GuardAction(_)));
        assert!(g.node(1).succs.is_empty());
        assert_eq!(g.predecessors()[2], vec![0]);
    }

    #[test]
    fn match_arms_rejoin_after_the_match() {
        let src = "type O = A | B\n\nfn f(o:O):i32 =\n  x!:i32 = 0\n  o | A -> x = 1 | B -> x = 2\n  ^x\n";
        let program = ail_parse::parse_source(src).expect("parse");
        let Some(Decl::Fn(f)) = program.decls.get(1) else {
            panic!("expected a function");
        };
        let g = PathGraph::build(&f.body);
        assert_eq!(g.node(1).succs, vec![(Edge::Arm(0), 2), (Edge::Arm(1), 3)]);
        assert_eq!(g.predecessors()[4], vec![2, 3]);
        assert!(!g.end_reachable());
    }

    #[test]
    fn statements_after_a_return_are_unreachable() {
        let b = body("fn f():() =\n  ^\n  panic!\n");
        let g = PathGraph::build(&b);
        assert_eq!(g.reachable(), vec![true, false, false]);
    }

    #[test]
    fn falling_off_the_end_reaches_end() {
        let b = body("fn f(b:bool):i32 = b ? ^1\n");
        assert!(PathGraph::build(&b).end_reachable());
    }
}
