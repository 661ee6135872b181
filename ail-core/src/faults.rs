#![forbid(unsafe_code)]

use ail_ast::{BinOp, Expr, ExprKind, Span, Stmt, UnaryOp};

use crate::config::FaultPolicy;
use crate::error::{Diagnostic, Diagnostics, ErrorKind, Severity};
use crate::flow::{NodeKind, PathGraph};
use crate::typeck::TypeTable;

#[derive(Clone, Debug, PartialEq)]
pub enum FaultKind {
    ExplicitPanic { message: Option<String> },
    DivisionByZero,
    /// Constant integer arithmetic leaves the range of its type.
    Overflow { ty: String },
}

/// A runtime fault that some path reaches.
#[derive(Clone, Debug, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct FaultReport {
    pub faults: Vec<Fault>,
    pub diags: Diagnostics,
}

pub struct FaultScanner<'g, 'a> {
    graph: &'g PathGraph<'a>,
    types: &'g TypeTable,
    policy: FaultPolicy,
    decl: String,
    report: FaultReport,
}

impl<'g, 'a> FaultScanner<'g, 'a> {
    pub fn new(graph: &'g PathGraph<'a>, types: &'g TypeTable, policy: FaultPolicy, decl: &str) -> Self {
        Self {
            graph,
            types,
            policy,
            decl: decl.to_string(),
            report: FaultReport::default(),
        }
    }

    pub fn run(mut self) -> FaultReport {
        let reachable = self.graph.reachable();
        for (i, node) in self.graph.nodes() {
            if !reachable[i] {
                continue;
            }
            match node.kind {
                NodeKind::Stmt(stmt) | NodeKind::GuardAction(stmt) => self.stmt(stmt),
                NodeKind::Arm(arm) => self.stmt(&arm.action),
                NodeKind::End => {}
            }
        }
        self.report
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(d) => {
                self.eval(&d.expr);
            }
            Stmt::Assign(a) => {
                self.eval(&a.expr);
            }
            Stmt::Return(r) => {
                if let Some(e) = &r.expr {
                    self.eval(e);
                }
            }
            Stmt::Guard(g) => {
                self.eval(&g.cond);
            }
            Stmt::Match(m) => {
                self.eval(&m.scrutinee);
            }
            Stmt::Expr(e) => {
                self.eval(e);
            }
            // Assertions are annotated but never reported.
            Stmt::Panic(p) => self.report.faults.push(Fault {
                kind: FaultKind::ExplicitPanic {
                    message: p.message.clone(),
                },
                span: p.span,
            }),
        }
    }

    /// Visits every subexpression and returns the constant value of an
    /// integer expression, when it has one.
    fn eval(&mut self, expr: &Expr) -> Option<i128> {
        match &expr.kind {
            ExprKind::IntLit(v) => self.in_range(expr, i128::from(*v)),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                expr: inner,
            } => match inner.kind {
                ExprKind::IntLit(v) => self.in_range(expr, -i128::from(v)),
                _ => {
                    let v = self.eval(inner)?;
                    self.in_range(expr, v.checked_neg()?)
                }
            },
            ExprKind::Unary { expr: inner, .. } => {
                self.eval(inner);
                None
            }
            ExprKind::Binary { left, op, right } => {
                let l = self.eval(left);
                let r = self.eval(right);
                if !op.is_arithmetic() || !self.is_int(expr) {
                    return None;
                }
                if matches!(op, BinOp::Div | BinOp::Rem) && r == Some(0) {
                    self.fault(FaultKind::DivisionByZero, "division by zero".to_string(), expr.span);
                    return None;
                }
                let (l, r) = (l?, r?);
                let v = match op {
                    BinOp::Add => l.checked_add(r),
                    BinOp::Sub => l.checked_sub(r),
                    BinOp::Mul => l.checked_mul(r),
                    BinOp::Div => l.checked_div(r),
                    BinOp::Rem => l.checked_rem(r),
                    _ => None,
                }?;
                self.in_range(expr, v)
            }
            ExprKind::Field { base, .. } => {
                self.eval(base);
                None
            }
            ExprKind::Call { args, .. } | ExprKind::VariantCtor { args, .. } => {
                for a in args {
                    self.eval(a);
                }
                None
            }
            ExprKind::RecordLit { fields, .. } => {
                for (_, value) in fields {
                    self.eval(value);
                }
                None
            }
            ExprKind::Ident(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::UnitLit => None,
        }
    }

    fn is_int(&self, expr: &Expr) -> bool {
        self.types
            .expr(expr)
            .and_then(|t| t.prim())
            .is_some_and(|p| p.is_int())
    }

    /// Passes `v` through when it fits the type of `expr`.
    fn in_range(&mut self, expr: &Expr, v: i128) -> Option<i128> {
        let ty = self.types.expr(expr)?;
        let (lo, hi) = ty.prim()?.int_range()?;
        if (lo..=hi).contains(&v) {
            return Some(v);
        }
        // Literals too large for their type are type errors already.
        if matches!(expr.kind, ExprKind::IntLit(_)) {
            return None;
        }
        let ty = ty.to_string();
        let message = format!("`{}` overflows `{ty}`", ail_parse::format_expr(expr));
        self.fault(FaultKind::Overflow { ty }, message, expr.span);
        None
    }

    fn fault(&mut self, kind: FaultKind, message: String, span: Span) {
        self.report.faults.push(Fault { kind, span });
        let severity = match self.policy {
            FaultPolicy::Allow => return,
            FaultPolicy::Warn => Severity::Warning,
            FaultPolicy::Deny => Severity::Error,
        };
        self.report.diags.push(
            Diagnostic::new(ErrorKind::ReachableFault, message, span)
                .with_severity(severity)
                .in_decl(Some(&self.decl)),
        );
    }
}
