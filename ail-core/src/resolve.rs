#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use ail_ast::{Block, Expr, ExprKind, Ident, Param, Pattern, Span, Stmt};

use crate::env::{Item, UnitEnv};
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::index::{FnSig, TypeDef};

/// Identity of one binding within a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Param,
    Local,
    Pattern,
}

#[derive(Clone, Debug)]
pub struct BindingInfo {
    pub name: String,
    pub span: Span,
    pub mutable: bool,
    pub kind: BindingKind,
}

/// What an identifier occurrence refers to.
#[derive(Clone, Debug)]
pub enum Res {
    Local(BindingId),
    Function(Arc<FnSig>),
    Variant { def: Arc<TypeDef>, index: usize },
    Type(Arc<TypeDef>),
}

/// Hashable key for a source span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanKey {
    pub offset: usize,
    pub len: usize,
}

impl From<Span> for SpanKey {
    fn from(span: Span) -> Self {
        Self {
            offset: span.offset(),
            len: span.len(),
        }
    }
}

/// Binding table plus per-occurrence resolutions for a whole unit.
#[derive(Clone, Debug, Default)]
pub struct Resolutions {
    bindings: Vec<BindingInfo>,
    uses: HashMap<SpanKey, Res>,
    defs: HashMap<SpanKey, BindingId>,
}

impl Resolutions {
    pub fn binding(&self, id: BindingId) -> &BindingInfo {
        &self.bindings[id.0 as usize]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &BindingInfo)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (BindingId(i as u32), b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolution of the identifier written at `span`.
    pub fn res(&self, span: Span) -> Option<&Res> {
        self.uses.get(&SpanKey::from(span))
    }

    /// The binding introduced by the name written at `span`.
    pub fn def(&self, span: Span) -> Option<BindingId> {
        self.defs.get(&SpanKey::from(span)).copied()
    }

    /// The local binding an identifier occurrence refers to.
    pub fn local(&self, span: Span) -> Option<BindingId> {
        match self.res(span)? {
            Res::Local(id) => Some(*id),
            _ => None,
        }
    }

    fn define(&mut self, name: &Ident, mutable: bool, kind: BindingKind) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(BindingInfo {
            name: name.node.clone(),
            span: name.span,
            mutable,
            kind,
        });
        self.defs.insert(name.span.into(), id);
        id
    }
}

/// Resolves the names in one function or test body.
pub struct BodyResolver<'r, 'e, 'a> {
    env: &'e UnitEnv<'a>,
    table: &'r mut Resolutions,
    scopes: Vec<HashMap<String, BindingId>>,
    decl: String,
    diags: Diagnostics,
}

impl<'r, 'e, 'a> BodyResolver<'r, 'e, 'a> {
    pub fn new(env: &'e UnitEnv<'a>, table: &'r mut Resolutions, decl: &str) -> Self {
        Self {
            env,
            table,
            scopes: vec![HashMap::new()],
            decl: decl.to_string(),
            diags: Diagnostics::new(),
        }
    }

    /// Parameters and top-level body statements share the outermost scope.
    pub fn resolve(mut self, params: &[Param], body: &Block) -> Diagnostics {
        for p in params {
            self.define(&p.name, p.mutable, BindingKind::Param);
        }
        for stmt in &body.stmts {
            self.resolve_stmt(stmt);
        }
        self.diags
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(d) => {
                self.resolve_expr(&d.expr);
                self.define(&d.name, d.mutable, BindingKind::Local);
            }
            Stmt::Assign(a) => {
                self.resolve_expr(&a.expr);
                match self.lookup_local(&a.target.node) {
                    Some(id) => self.record(a.target.span, Res::Local(id)),
                    None => self.error(
                        ErrorKind::UnresolvedName,
                        format!("cannot assign to `{}`: no such binding", a.target.node),
                        a.target.span,
                    ),
                }
            }
            Stmt::Return(r) => {
                if let Some(e) = &r.expr {
                    self.resolve_expr(e);
                }
            }
            Stmt::Guard(g) => {
                self.resolve_expr(&g.cond);
                self.resolve_stmt(&g.action);
            }
            Stmt::Match(m) => {
                self.resolve_expr(&m.scrutinee);
                for arm in &m.arms {
                    self.scopes.push(HashMap::new());
                    self.resolve_pattern(&arm.pat);
                    self.resolve_stmt(&arm.action);
                    self.scopes.pop();
                }
            }
            Stmt::Expr(e) => self.resolve_expr(e),
            Stmt::Panic(_) => {}
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(id) => self.resolve_value(id),
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::UnitLit => {}
            ExprKind::Unary { expr, .. } => self.resolve_expr(expr),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Field { base, .. } => self.resolve_expr(base),
            ExprKind::Call { callee, args } => {
                self.resolve_callee(callee);
                for a in args {
                    self.resolve_expr(a);
                }
            }
            ExprKind::VariantCtor { variant, args } => {
                self.resolve_variant(variant);
                for a in args {
                    self.resolve_expr(a);
                }
            }
            ExprKind::RecordLit { name, fields } => {
                match self.env.lookup(&name.node) {
                    Some(Item::Type(def)) if !def.is_sum() => {
                        self.record(name.span, Res::Type(def.clone()));
                    }
                    Some(Item::Type(_)) => self.error(
                        ErrorKind::UnknownType,
                        format!("`{}` is a sum type; build it through a variant", name.node),
                        name.span,
                    ),
                    _ => self.error(
                        ErrorKind::UnknownType,
                        format!("unknown record type `{}`", name.node),
                        name.span,
                    ),
                }
                for (_, value) in fields {
                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_pattern(&mut self, pat: &Pattern) {
        match pat {
            Pattern::Wildcard { .. } => {}
            Pattern::Binding(id) => {
                self.define(id, false, BindingKind::Pattern);
            }
            Pattern::Ctor {
                variant,
                subpatterns,
                ..
            } => {
                self.resolve_variant(variant);
                for p in subpatterns {
                    self.resolve_pattern(p);
                }
            }
        }
    }

    fn resolve_value(&mut self, id: &Ident) {
        if let Some(b) = self.lookup_local(&id.node) {
            self.record(id.span, Res::Local(b));
            return;
        }
        match self.env.lookup(&id.node) {
            Some(Item::Function(sig)) => self.record(id.span, Res::Function(sig.clone())),
            _ => self.error(
                ErrorKind::UnresolvedName,
                format!("cannot find value `{}` in this scope", id.node),
                id.span,
            ),
        }
    }

    fn resolve_callee(&mut self, id: &Ident) {
        if let Some(b) = self.lookup_local(&id.node) {
            self.record(id.span, Res::Local(b));
            return;
        }
        match self.env.lookup(&id.node) {
            Some(Item::Function(sig)) => self.record(id.span, Res::Function(sig.clone())),
            _ => self.error(
                ErrorKind::UnresolvedName,
                format!("cannot find function `{}`", id.node),
                id.span,
            ),
        }
    }

    fn resolve_variant(&mut self, id: &Ident) {
        match self.env.lookup(&id.node) {
            Some(Item::Variant { def, index }) => {
                let res = Res::Variant {
                    def: def.clone(),
                    index: *index,
                };
                self.record(id.span, res);
            }
            Some(Item::Type(_)) => self.error(
                ErrorKind::UnknownType,
                format!("`{}` is a type, not a variant", id.node),
                id.span,
            ),
            _ => {
                let (kind, message) = match self.env.ambiguous_variant(&id.node) {
                    Some(types) => {
                        let types: Vec<String> = types.iter().map(|t| format!("`{t}`")).collect();
                        (
                            ErrorKind::UnresolvedName,
                            format!(
                                "ambiguous variant `{}`: provided by {}",
                                id.node,
                                types.join(" and ")
                            ),
                        )
                    }
                    None => (
                        ErrorKind::UnknownType,
                        format!("unknown variant `{}`", id.node),
                    ),
                };
                self.error(kind, message, id.span);
            }
        }
    }

    fn define(&mut self, name: &Ident, mutable: bool, kind: BindingKind) {
        let scope = self.scopes.last().map(|s| s.contains_key(&name.node));
        if scope == Some(true) {
            self.error(
                ErrorKind::DuplicateBinding,
                format!("`{}` is already bound in this scope", name.node),
                name.span,
            );
            return;
        }
        let id = self.table.define(name, mutable, kind);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.node.clone(), id);
        }
    }

    fn lookup_local(&self, name: &str) -> Option<BindingId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn record(&mut self, span: Span, res: Res) {
        self.table.uses.insert(span.into(), res);
    }

    fn error(&mut self, kind: ErrorKind, message: String, span: Span) {
        self.diags
            .push(Diagnostic::new(kind, message, span).in_decl(Some(&self.decl)));
    }
}
