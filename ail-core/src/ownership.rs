//! Move tracking over the path graph.
//!
//! Copy bindings are always live. A Move binding becomes moved when it is
//! used as a value-producing operand and is live again after assignment.
//! Where paths reconverge a binding is moved only when it is moved on every
//! incoming path. Records are moved whole, so a Move-typed field can never
//! be reached by access.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use ail_ast::{Expr, ExprKind, Span, Stmt};

use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::flow::{NodeKind, PathGraph};
use crate::resolve::{BindingId, Resolutions};
use crate::typeck::TypeTable;

/// A binding consumed at `span`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveSite {
    pub binding: BindingId,
    pub span: Span,
}

/// Moved bindings and where they were moved; live bindings are absent.
type Flow = BTreeMap<BindingId, Span>;

#[derive(Debug, Default)]
pub struct OwnershipReport {
    pub diags: Diagnostics,
    pub moves: Vec<MoveSite>,
}

pub struct MoveChecker<'g, 'a> {
    graph: &'g PathGraph<'a>,
    res: &'g Resolutions,
    types: &'g TypeTable,
    decl: String,
    report: OwnershipReport,
}

impl<'g, 'a> MoveChecker<'g, 'a> {
    pub fn new(
        graph: &'g PathGraph<'a>,
        res: &'g Resolutions,
        types: &'g TypeTable,
        decl: &str,
    ) -> Self {
        Self {
            graph,
            res,
            types,
            decl: decl.to_string(),
            report: OwnershipReport::default(),
        }
    }

    pub fn run(mut self) -> OwnershipReport {
        let preds = self.graph.predecessors();
        let reachable = self.graph.reachable();
        let mut outs: Vec<Option<Flow>> = vec![None; self.graph.len()];

        for (i, node) in self.graph.nodes() {
            if !reachable[i] {
                continue;
            }
            let incoming: Vec<&Flow> = preds[i]
                .iter()
                .filter_map(|&p| outs[p].as_ref())
                .collect();
            let mut flow = merge(&incoming);
            match node.kind {
                NodeKind::Stmt(stmt) => self.stmt(stmt, &mut flow),
                NodeKind::GuardAction(stmt) => self.stmt(stmt, &mut flow),
                NodeKind::Arm(arm) => self.stmt(&arm.action, &mut flow),
                NodeKind::End => {}
            }
            outs[i] = Some(flow);
        }
        self.report
    }

    /// Effect of a graph node. Guards and matches contribute only the
    /// evaluation of their condition or scrutinee.
    fn stmt(&mut self, stmt: &Stmt, flow: &mut Flow) {
        match stmt {
            Stmt::Decl(d) => {
                self.consume(&d.expr, flow);
                if let Some(id) = self.res.def(d.name.span) {
                    flow.remove(&id);
                }
            }
            Stmt::Assign(a) => {
                self.consume(&a.expr, flow);
                if let Some(id) = self.res.local(a.target.span) {
                    flow.remove(&id);
                }
            }
            Stmt::Return(r) => {
                if let Some(e) = &r.expr {
                    self.consume(e, flow);
                }
            }
            Stmt::Guard(g) => self.read(&g.cond, flow),
            Stmt::Match(m) => self.consume(&m.scrutinee, flow),
            Stmt::Expr(e) => self.consume(e, flow),
            Stmt::Panic(_) => {}
        }
    }

    /// Value-producing position: a Move binding named here is consumed.
    fn consume(&mut self, expr: &Expr, flow: &mut Flow) {
        match &expr.kind {
            ExprKind::Ident(id) => {
                let Some(b) = self.res.local(id.span).filter(|&b| self.is_move(b)) else {
                    return self.read(expr, flow);
                };
                if self.use_binding(b, id.span, flow) {
                    flow.insert(b, id.span);
                    self.report.moves.push(MoveSite {
                        binding: b,
                        span: id.span,
                    });
                }
            }
            _ => self.read(expr, flow),
        }
    }

    /// Operand position: bindings must be usable but are not consumed.
    fn read(&mut self, expr: &Expr, flow: &mut Flow) {
        match &expr.kind {
            ExprKind::Ident(id) => {
                if let Some(b) = self.res.local(id.span) {
                    self.use_binding(b, id.span, flow);
                }
            }
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::UnitLit => {}
            ExprKind::Unary { expr, .. } => self.read(expr, flow),
            ExprKind::Binary { left, right, .. } => {
                self.read(left, flow);
                self.read(right, flow);
            }
            ExprKind::Field { base, field } => {
                self.read(base, flow);
                if self.is_move_expr(expr) {
                    self.error(
                        ErrorKind::InvalidFieldAccessOnMove,
                        format!(
                            "field `{}` has a Move type; move or rebuild the whole record",
                            field.node
                        ),
                        expr.span,
                    );
                }
            }
            ExprKind::Call { args, .. } | ExprKind::VariantCtor { args, .. } => {
                for a in args {
                    self.consume(a, flow);
                }
            }
            ExprKind::RecordLit { fields, .. } => {
                for (_, value) in fields {
                    self.consume(value, flow);
                }
            }
        }
    }

    /// Whether `b` was usable. An unusable binding is reported once and then
    /// treated as live, so later uses on this path are not errors again.
    fn use_binding(&mut self, b: BindingId, span: Span, flow: &mut Flow) -> bool {
        let Some(at) = flow.remove(&b) else {
            return true;
        };
        let message = format!(
            "use of `{}` after it was moved at offset {}",
            self.res.binding(b).name,
            at.offset()
        );
        self.error(ErrorKind::UseAfterMove, message, span);
        false
    }

    fn is_move(&self, b: BindingId) -> bool {
        self.types.binding(b).is_some_and(|t| t.is_move())
    }

    fn is_move_expr(&self, expr: &Expr) -> bool {
        self.types.expr(expr).is_some_and(|t| t.is_move())
    }

    fn error(&mut self, kind: ErrorKind, message: String, span: Span) {
        self.report
            .diags
            .push(Diagnostic::new(kind, message, span).in_decl(Some(&self.decl)));
    }
}

/// A binding stays moved only when every incoming path moved it.
fn merge(incoming: &[&Flow]) -> Flow {
    let Some((first, rest)) = incoming.split_first() else {
        return Flow::new();
    };
    first
        .iter()
        .filter(|(b, _)| rest.iter().all(|f| f.contains_key(b)))
        .map(|(&b, &at)| (b, at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(offset: usize) -> Span {
        ail_ast::span(offset, 1)
    }

    #[test]
    fn moved_on_every_path_stays_moved() {
        let a = Flow::from([(BindingId(0), span(1))]);
        let b = Flow::from([(BindingId(0), span(5))]);
        let merged = merge(&[&a, &b]);
        assert_eq!(merged.get(&BindingId(0)), Some(&span(1)));
    }

    #[test]
    fn moved_on_some_paths_is_live() {
        let a = Flow::from([(BindingId(0), span(1))]);
        let b = Flow::new();
        assert!(merge(&[&b, &a]).is_empty());
        assert!(merge(&[&a, &b]).is_empty());
    }

    #[test]
    fn single_path_passes_through() {
        let a = Flow::from([(BindingId(3), span(2))]);
        assert_eq!(merge(&[&a]), a);
        assert!(merge(&[]).is_empty());
    }
}
