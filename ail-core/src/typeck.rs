#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use ail_ast::{BinOp, Block, Expr, ExprKind, Ident, Pattern, Span, Stmt, UnaryOp};

use crate::env::UnitEnv;
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::index::TypeDef;
use crate::resolve::{BindingId, Res, Resolutions, SpanKey};
use crate::types::{Prim, Type};

/// Types of every expression, pattern and binding of a unit.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    exprs: HashMap<SpanKey, Type>,
    patterns: HashMap<SpanKey, Type>,
    bindings: HashMap<BindingId, Type>,
}

impl TypeTable {
    pub fn expr(&self, expr: &Expr) -> Option<&Type> {
        self.exprs.get(&SpanKey::from(expr.span))
    }

    pub fn pattern(&self, pat: &Pattern) -> Option<&Type> {
        self.patterns.get(&SpanKey::from(pat.span()))
    }

    pub fn binding(&self, id: BindingId) -> Option<&Type> {
        self.bindings.get(&id)
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

/// Checks one function or test body against its signature.
pub struct TypeChecker<'t, 'e, 'a> {
    env: &'e UnitEnv<'a>,
    res: &'t Resolutions,
    table: &'t mut TypeTable,
    ret: Type,
    decl: String,
    diags: Diagnostics,
}

impl<'t, 'e, 'a> TypeChecker<'t, 'e, 'a> {
    pub fn new(
        env: &'e UnitEnv<'a>,
        res: &'t Resolutions,
        table: &'t mut TypeTable,
        decl: &str,
        ret: Type,
    ) -> Self {
        Self {
            env,
            res,
            table,
            ret,
            decl: decl.to_string(),
            diags: Diagnostics::new(),
        }
    }

    /// Records the type of the parameter whose name is written at `name`.
    pub fn bind_param(&mut self, name: &Ident, ty: Type) {
        if let Some(id) = self.res.def(name.span) {
            self.table.bindings.insert(id, ty);
        }
    }

    pub fn check_block(mut self, body: &Block) -> Diagnostics {
        for stmt in &body.stmts {
            self.check_stmt(stmt);
        }
        self.diags
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(d) => {
                let declared = match self.env.resolve_type_ref(&d.ty, &[]) {
                    Ok(ty) => ty,
                    Err(diag) => {
                        self.diags.push(diag.in_decl(Some(&self.decl)));
                        Type::Error
                    }
                };
                self.check(&d.expr, &declared);
                if let Some(id) = self.res.def(d.name.span) {
                    self.table.bindings.insert(id, declared);
                }
            }
            Stmt::Assign(a) => {
                let Some(id) = self.res.local(a.target.span) else {
                    self.infer(&a.expr, None);
                    return;
                };
                let binding = self.res.binding(id);
                if !binding.mutable {
                    self.error(
                        ErrorKind::ImmutableAssignment,
                        format!(
                            "cannot assign twice to `{}`; declare it with `{}!`",
                            binding.name, binding.name
                        ),
                        a.target.span,
                    );
                }
                let ty = self.binding_type(id);
                self.check(&a.expr, &ty);
            }
            Stmt::Return(r) => match &r.expr {
                Some(e) => {
                    let ret = self.ret.clone();
                    self.check(e, &ret);
                }
                None => {
                    if !self.ret.is_unit() && !self.ret.is_error() {
                        self.error(
                            ErrorKind::TypeMismatch,
                            format!("bare `^` in a body returning `{}`", self.ret),
                            r.span,
                        );
                    }
                }
            },
            Stmt::Guard(g) => {
                self.check_truth(&g.cond);
                self.check_stmt(&g.action);
            }
            Stmt::Match(m) => {
                let ty = self.infer(&m.scrutinee, None);
                for arm in &m.arms {
                    self.check_pattern(&arm.pat, &ty);
                    self.check_stmt(&arm.action);
                }
            }
            Stmt::Expr(e) => {
                self.infer(e, None);
            }
            Stmt::Panic(_) => {}
        }
    }

    /// Checks `expr` against `expected`, reporting a mismatch at the expression.
    fn check(&mut self, expr: &Expr, expected: &Type) -> Type {
        let found = self.infer(expr, Some(expected));
        if !found.compatible(expected) {
            self.error(
                ErrorKind::TypeMismatch,
                format!("expected `{expected}`, found `{found}`"),
                expr.span,
            );
        }
        found
    }

    fn check_truth(&mut self, expr: &Expr) {
        let ty = self.infer(expr, None);
        if !ty.is_bool() && !ty.is_error() {
            self.error(
                ErrorKind::NoImplicitCoercion,
                format!("expected `bool`, found `{ty}`; no implicit truthiness"),
                expr.span,
            );
        }
    }

    fn infer(&mut self, expr: &Expr, expected: Option<&Type>) -> Type {
        let ty = self.infer_kind(expr, expected);
        self.table.exprs.insert(expr.span.into(), ty.clone());
        ty
    }

    fn infer_kind(&mut self, expr: &Expr, expected: Option<&Type>) -> Type {
        match &expr.kind {
            ExprKind::Ident(id) => match self.res.res(id.span) {
                Some(Res::Local(b)) => self.binding_type(*b),
                Some(Res::Function(sig)) => {
                    let message = format!("function `{}` cannot be used as a value", sig.name);
                    self.error(ErrorKind::TypeMismatch, message, id.span);
                    Type::Error
                }
                _ => Type::Error,
            },
            ExprKind::IntLit(v) => {
                if *v > i32::MAX as u64 {
                    self.error(
                        ErrorKind::TypeMismatch,
                        format!("integer literal `{v}` does not fit `i32`"),
                        expr.span,
                    );
                    return Type::Error;
                }
                Type::I32
            }
            ExprKind::FloatLit(_) => Type::F64,
            ExprKind::BoolLit(_) => Type::BOOL,
            ExprKind::StringLit(_) => Type::STR,
            ExprKind::UnitLit => Type::UNIT,
            ExprKind::Unary { op, expr: inner } => self.infer_unary(*op, inner),
            ExprKind::Binary { left, op, right } => self.infer_binary(expr.span, left, *op, right),
            ExprKind::Field { base, field } => self.infer_field(base, field),
            ExprKind::Call { callee, args } => self.infer_call(callee, args),
            ExprKind::VariantCtor { variant, args } => {
                let Some(Res::Variant { def, index }) = self.res.res(variant.span).cloned() else {
                    self.infer_all(args);
                    return Type::Error;
                };
                let payload = def
                    .variants()
                    .get(index)
                    .map(|v| v.payload.clone())
                    .unwrap_or_default();
                if payload.len() != args.len() {
                    self.error(
                        ErrorKind::ArityMismatch,
                        format!(
                            "`{}` takes {} value(s), found {}",
                            variant.node,
                            payload.len(),
                            args.len()
                        ),
                        expr.span,
                    );
                    self.infer_all(args);
                    return Type::Error;
                }
                let pairs: Vec<(&Expr, Type)> = args.iter().zip(payload).collect();
                self.instantiate(&def, expected, pairs, expr.span)
            }
            ExprKind::RecordLit { name, fields } => {
                let Some(Res::Type(def)) = self.res.res(name.span).cloned() else {
                    for (_, value) in fields {
                        self.infer(value, None);
                    }
                    return Type::Error;
                };
                self.infer_record(&def, fields, expected, expr.span)
            }
        }
    }

    fn infer_all(&mut self, exprs: &[Expr]) {
        for e in exprs {
            self.infer(e, None);
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, inner: &Expr) -> Type {
        match op {
            UnaryOp::Not => {
                self.check_truth(inner);
                Type::BOOL
            }
            UnaryOp::Neg => {
                // `-2147483648` is the only spelling of i32::MIN.
                if matches!(inner.kind, ExprKind::IntLit(v) if v == i32::MAX as u64 + 1) {
                    self.table.exprs.insert(inner.span.into(), Type::I32);
                    return Type::I32;
                }
                let ty = self.infer(inner, None);
                match ty.prim() {
                    _ if ty.is_error() => ty,
                    Some(p) if p.is_signed_int() || p.is_float() => ty,
                    _ => {
                        self.error(
                            ErrorKind::TypeMismatch,
                            format!("cannot negate a value of type `{ty}`"),
                            inner.span,
                        );
                        Type::Error
                    }
                }
            }
        }
    }

    fn infer_binary(&mut self, span: Span, left: &Expr, op: BinOp, right: &Expr) -> Type {
        if op.is_logical() {
            self.check_truth(left);
            self.check_truth(right);
            return Type::BOOL;
        }

        let l = self.infer(left, None);
        let r = self.infer(right, None);
        if l.is_error() || r.is_error() {
            return if op.is_arithmetic() { Type::Error } else { Type::BOOL };
        }
        if l != r {
            self.error(
                ErrorKind::TypeMismatch,
                format!("mismatched operands for `{}`: `{l}` and `{r}`", op.symbol()),
                span,
            );
            return if op.is_arithmetic() { Type::Error } else { Type::BOOL };
        }
        if op.is_equality() {
            return Type::BOOL;
        }

        let numeric = l.prim().is_some_and(Prim::is_numeric);
        let integral = l.prim().is_some_and(Prim::is_int);
        if !numeric || (op == BinOp::Rem && !integral) {
            self.error(
                ErrorKind::TypeMismatch,
                format!("`{}` is not defined on `{l}`", op.symbol()),
                span,
            );
            return if op.is_arithmetic() { Type::Error } else { Type::BOOL };
        }
        if op.is_ordering() { Type::BOOL } else { l }
    }

    fn infer_field(&mut self, base: &Expr, field: &Ident) -> Type {
        let bt = self.infer(base, None);
        if bt.is_error() {
            return Type::Error;
        }
        let Some(def) = self.env.type_def(&bt).filter(|d| !d.is_sum()) else {
            self.error(
                ErrorKind::TypeMismatch,
                format!("`{bt}` has no fields"),
                field.span,
            );
            return Type::Error;
        };
        match def.field(&field.node) {
            Some(f) => f.ty.substitute(&def.substitution(&bt)),
            None => {
                self.error(
                    ErrorKind::UnknownType,
                    format!("no field `{}` on `{bt}`", field.node),
                    field.span,
                );
                Type::Error
            }
        }
    }

    fn infer_call(&mut self, callee: &Ident, args: &[Expr]) -> Type {
        let sig = match self.res.res(callee.span) {
            Some(Res::Function(sig)) => sig.clone(),
            Some(Res::Local(_)) => {
                self.error(
                    ErrorKind::TypeMismatch,
                    format!("`{}` is not a function", callee.node),
                    callee.span,
                );
                self.infer_all(args);
                return Type::Error;
            }
            _ => {
                self.infer_all(args);
                return Type::Error;
            }
        };
        if sig.params.len() != args.len() {
            self.error(
                ErrorKind::ArityMismatch,
                format!(
                    "`{}` takes {} argument(s), found {}",
                    sig.name,
                    sig.params.len(),
                    args.len()
                ),
                callee.span,
            );
            self.infer_all(args);
            return sig.ret.clone();
        }
        for (arg, (_, ty)) in args.iter().zip(&sig.params) {
            self.check(arg, ty);
        }
        sig.ret.clone()
    }

    fn infer_record(
        &mut self,
        def: &Arc<TypeDef>,
        fields: &[(Ident, Expr)],
        expected: Option<&Type>,
        span: Span,
    ) -> Type {
        let mut seen: Vec<&str> = Vec::new();
        let mut pairs: Vec<(&Expr, Type)> = Vec::new();
        for (name, value) in fields {
            if seen.contains(&name.node.as_str()) {
                self.error(
                    ErrorKind::DuplicateBinding,
                    format!("field `{}` is given twice", name.node),
                    name.span,
                );
                self.infer(value, None);
                continue;
            }
            seen.push(&name.node);
            match def.field(&name.node) {
                Some(f) => pairs.push((value, f.ty.clone())),
                None => {
                    self.error(
                        ErrorKind::UnknownType,
                        format!("no field `{}` on `{}`", name.node, def.name),
                        name.span,
                    );
                    self.infer(value, None);
                }
            }
        }

        let missing: Vec<&str> = def
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .filter(|f| !seen.contains(f))
            .collect();
        if !missing.is_empty() {
            self.error(
                ErrorKind::ArityMismatch,
                format!(
                    "missing field(s) {} in `{}` literal",
                    missing
                        .iter()
                        .map(|m| format!("`{m}`"))
                        .collect::<Vec<_>>()
                        .join(", "),
                    def.name
                ),
                span,
            );
        }
        self.instantiate(def, expected, pairs, span)
    }

    /// Checks constructor operands against declared types and returns the
    /// constructed instance. Type arguments come from `expected` when it is
    /// an instance of `def`, otherwise from the operands.
    fn instantiate(
        &mut self,
        def: &Arc<TypeDef>,
        expected: Option<&Type>,
        pairs: Vec<(&Expr, Type)>,
        span: Span,
    ) -> Type {
        if let Some(expected) = expected.filter(|e| def.describes(e)) {
            let subst = def.substitution(expected);
            for (expr, ty) in pairs {
                self.check(expr, &ty.substitute(&subst));
            }
            return expected.clone();
        }

        let mut map: HashMap<String, Option<Type>> =
            def.params.iter().map(|p| (p.clone(), None)).collect();
        for (expr, ty) in pairs {
            if !mentions_params(&ty) {
                self.check(expr, &ty);
                continue;
            }
            let found = self.infer(expr, None);
            if !ty.bind_params(&found, &mut map) {
                self.error(
                    ErrorKind::TypeMismatch,
                    format!("expected `{ty}`, found `{found}`"),
                    expr.span,
                );
            }
        }

        let mut args = Vec::with_capacity(def.params.len());
        for p in &def.params {
            match map.get(p).cloned().flatten() {
                Some(t) => args.push(t),
                None => {
                    self.error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "cannot infer type argument `{p}` of `{}`; annotate the expected type",
                            def.name
                        ),
                        span,
                    );
                    return Type::Error;
                }
            }
        }
        def.instance(args)
    }

    fn check_pattern(&mut self, pat: &Pattern, ty: &Type) {
        self.table.patterns.insert(pat.span().into(), ty.clone());
        match pat {
            Pattern::Wildcard { .. } => {}
            Pattern::Binding(id) => {
                if let Some(b) = self.res.def(id.span) {
                    self.table.bindings.insert(b, ty.clone());
                }
            }
            Pattern::Ctor {
                span,
                variant,
                subpatterns,
            } => {
                let Some(Res::Variant { def, index }) = self.res.res(variant.span).cloned() else {
                    self.poison_patterns(subpatterns);
                    return;
                };
                if ty.is_error() {
                    self.poison_patterns(subpatterns);
                    return;
                }
                if !def.describes(ty) {
                    self.error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "pattern `{}` belongs to `{}`, but the scrutinee is `{ty}`",
                            variant.node, def.name
                        ),
                        *span,
                    );
                    self.poison_patterns(subpatterns);
                    return;
                }
                let payload = def.payload_of(index, ty);
                if payload.len() != subpatterns.len() {
                    self.error(
                        ErrorKind::ArityMismatch,
                        format!(
                            "`{}` has {} field(s), the pattern has {}",
                            variant.node,
                            payload.len(),
                            subpatterns.len()
                        ),
                        *span,
                    );
                    self.poison_patterns(subpatterns);
                    return;
                }
                for (sub, sub_ty) in subpatterns.iter().zip(&payload) {
                    self.check_pattern(sub, sub_ty);
                }
            }
        }
    }

    fn poison_patterns(&mut self, pats: &[Pattern]) {
        for p in pats {
            self.check_pattern(p, &Type::Error);
        }
    }

    fn binding_type(&self, id: BindingId) -> Type {
        self.table.binding(id).cloned().unwrap_or(Type::Error)
    }

    fn error(&mut self, kind: ErrorKind, message: String, span: Span) {
        self.diags
            .push(Diagnostic::new(kind, message, span).in_decl(Some(&self.decl)));
    }
}

fn mentions_params(ty: &Type) -> bool {
    match ty {
        Type::Param(_) => true,
        Type::Named { args, .. } => args.iter().any(mentions_params),
        _ => false,
    }
}
