//! Match exhaustiveness and arm reachability.
//!
//! Arms are lowered to a pattern matrix and checked with the usefulness
//! algorithm: a match is exhaustive when the all-wildcard row is useless
//! after every arm, and an arm is reachable when it is useful against the
//! arms above it. Only sum types have a finite constructor set; every other
//! type is covered by a wildcard or a binding alone.

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use ail_ast::{Block, MatchStmt, Pattern, Stmt};

use crate::env::UnitEnv;
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::index::TypeDef;
use crate::resolve::{Res, Resolutions};
use crate::typeck::TypeTable;
use crate::types::Type;

/// Pattern with bindings erased.
#[derive(Clone, Debug, PartialEq)]
pub enum Pat {
    Wild,
    Ctor {
        index: usize,
        name: String,
        args: Vec<Pat>,
    },
}

impl fmt::Display for Pat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pat::Wild => f.write_str("_"),
            Pat::Ctor { name, args, .. } if args.is_empty() => f.write_str(name),
            Pat::Ctor { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
        }
    }
}

type Row = Vec<Pat>;

/// Answers constructor questions about column types.
pub struct Matrix<'e, 'a> {
    env: &'e UnitEnv<'a>,
}

impl<'e, 'a> Matrix<'e, 'a> {
    pub fn new(env: &'e UnitEnv<'a>) -> Self {
        Self { env }
    }

    fn sum_def(&self, ty: &Type) -> Option<Arc<TypeDef>> {
        self.env.type_def(ty).filter(|d| d.is_sum())
    }

    /// Column types after specializing the first column by variant `index`.
    fn specialized_types(&self, def: &TypeDef, index: usize, tys: &[Type]) -> Vec<Type> {
        let mut out = def.payload_of(index, &tys[0]);
        out.extend_from_slice(&tys[1..]);
        out
    }

    /// True when `v` matches some value no row of `rows` matches.
    pub fn is_useful(&self, rows: &[Row], v: &[Pat], tys: &[Type]) -> bool {
        if v.is_empty() {
            return rows.is_empty();
        }
        let def = self.sum_def(&tys[0]);
        match (&v[0], def) {
            (Pat::Ctor { index, args, .. }, Some(def)) => {
                let sub = specialize(rows, *index, args.len());
                let mut v2 = args.clone();
                v2.extend_from_slice(&v[1..]);
                self.is_useful(&sub, &v2, &self.specialized_types(&def, *index, tys))
            }
            (_, Some(def)) if covers_all(rows, &def) => (0..def.variants().len()).any(|c| {
                let arity = def.variants()[c].payload.len();
                let sub = specialize(rows, c, arity);
                let mut v2 = vec![Pat::Wild; arity];
                v2.extend_from_slice(&v[1..]);
                self.is_useful(&sub, &v2, &self.specialized_types(&def, c, tys))
            }),
            _ => self.is_useful(&default_rows(rows), &v[1..], &tys[1..]),
        }
    }

    /// Value shapes no row matches, as witness rows.
    pub fn witnesses(&self, rows: &[Row], tys: &[Type]) -> Vec<Row> {
        if tys.is_empty() {
            return if rows.is_empty() { vec![Vec::new()] } else { Vec::new() };
        }
        let Some(def) = self.sum_def(&tys[0]) else {
            return prepend_wild(self.witnesses(&default_rows(rows), &tys[1..]));
        };

        let variants = def.variants();
        if covers_all(rows, &def) {
            let mut out = Vec::new();
            for (c, v) in variants.iter().enumerate() {
                let arity = v.payload.len();
                let sub = specialize(rows, c, arity);
                for mut w in self.witnesses(&sub, &self.specialized_types(&def, c, tys)) {
                    let rest = w.split_off(arity);
                    let mut row = vec![Pat::Ctor {
                        index: c,
                        name: v.name.clone(),
                        args: w,
                    }];
                    row.extend(rest);
                    out.push(row);
                }
            }
            return out;
        }

        let rest = self.witnesses(&default_rows(rows), &tys[1..]);
        let used = used_ctors(rows);
        if used.is_empty() {
            return prepend_wild(rest);
        }
        let mut out = Vec::new();
        for (c, v) in variants.iter().enumerate() {
            if used.contains(&c) {
                continue;
            }
            for w in &rest {
                let mut row = vec![Pat::Ctor {
                    index: c,
                    name: v.name.clone(),
                    args: vec![Pat::Wild; v.payload.len()],
                }];
                row.extend(w.iter().cloned());
                out.push(row);
            }
        }
        out
    }

    /// Lowers a source pattern checked against `ty`; `None` when the
    /// pattern does not fit the type.
    pub fn lower(&self, pat: &Pattern, ty: &Type, res: &Resolutions) -> Option<Pat> {
        match pat {
            Pattern::Wildcard { .. } | Pattern::Binding(_) => Some(Pat::Wild),
            Pattern::Ctor {
                variant,
                subpatterns,
                ..
            } => {
                let Some(Res::Variant { def, index }) = res.res(variant.span) else {
                    return None;
                };
                if !def.describes(ty) {
                    return None;
                }
                let payload = def.payload_of(*index, ty);
                if payload.len() != subpatterns.len() {
                    return None;
                }
                let args = subpatterns
                    .iter()
                    .zip(&payload)
                    .map(|(p, t)| self.lower(p, t, res))
                    .collect::<Option<Vec<_>>>()?;
                Some(Pat::Ctor {
                    index: *index,
                    name: variant.node.clone(),
                    args,
                })
            }
        }
    }
}

fn covers_all(rows: &[Row], def: &TypeDef) -> bool {
    let used = used_ctors(rows);
    (0..def.variants().len()).all(|c| used.contains(&c))
}

fn used_ctors(rows: &[Row]) -> Vec<usize> {
    let mut used: Vec<usize> = rows
        .iter()
        .filter_map(|r| match r.first() {
            Some(Pat::Ctor { index, .. }) => Some(*index),
            _ => None,
        })
        .collect();
    used.sort_unstable();
    used.dedup();
    used
}

fn specialize(rows: &[Row], index: usize, arity: usize) -> Vec<Row> {
    rows.iter()
        .filter_map(|r| match &r[0] {
            Pat::Ctor { index: c, args, .. } if *c == index => {
                let mut row = args.clone();
                row.extend_from_slice(&r[1..]);
                Some(row)
            }
            Pat::Ctor { .. } => None,
            Pat::Wild => {
                let mut row = vec![Pat::Wild; arity];
                row.extend_from_slice(&r[1..]);
                Some(row)
            }
        })
        .collect()
}

fn default_rows(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .filter(|r| r[0] == Pat::Wild)
        .map(|r| r[1..].to_vec())
        .collect()
}

fn prepend_wild(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .map(|r| {
            let mut row = vec![Pat::Wild];
            row.extend(r);
            row
        })
        .collect()
}

/// Checks every pipe-match of a body.
pub fn check_matches(
    env: &UnitEnv<'_>,
    res: &Resolutions,
    types: &TypeTable,
    body: &Block,
    decl: &str,
    report_unreachable: bool,
) -> Diagnostics {
    let matrix = Matrix::new(env);
    let mut diags = Diagnostics::new();
    for stmt in &body.stmts {
        let m = match stmt {
            Stmt::Match(m) => m,
            _ => continue,
        };
        check_match(&matrix, res, types, m, decl, report_unreachable, &mut diags);
    }
    diags
}

fn check_match(
    matrix: &Matrix<'_, '_>,
    res: &Resolutions,
    types: &TypeTable,
    m: &MatchStmt,
    decl: &str,
    report_unreachable: bool,
    diags: &mut Diagnostics,
) {
    let Some(ty) = types.expr(&m.scrutinee).filter(|t| !t.contains_error()) else {
        return;
    };
    let Some(rows) = m
        .arms
        .iter()
        .map(|arm| matrix.lower(&arm.pat, ty, res).map(|p| vec![p]))
        .collect::<Option<Vec<Row>>>()
    else {
        return;
    };
    let tys = std::slice::from_ref(ty);

    if report_unreachable {
        for (i, arm) in m.arms.iter().enumerate() {
            if !matrix.is_useful(&rows[..i], &rows[i], tys) {
                diags.push(
                    Diagnostic::new(
                        ErrorKind::UnreachableArm,
                        "this arm is covered by the arms above it",
                        arm.span,
                    )
                    .in_decl(Some(decl)),
                );
            }
        }
    }

    let missing = matrix.witnesses(&rows, tys);
    if !missing.is_empty() {
        let shown: Vec<String> = missing
            .iter()
            .map(|w| format!("`{}`", w[0]))
            .collect();
        diags.push(
            Diagnostic::new(
                ErrorKind::NonExhaustiveMatch,
                format!("non-exhaustive match on `{ty}`: {} not covered", shown.join(", ")),
                m.span,
            )
            .in_decl(Some(decl)),
        );
    }
}
