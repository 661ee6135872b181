#![forbid(unsafe_code)]

use ail_ast::{
    BinOp, Block, Decl, Expr, ExprKind, FnDecl, Pattern, Program, Shape, Stmt, TestDecl, TypeDecl,
    TypeRef, UnaryOp, UseDecl,
};

const INDENT: &str = "  ";

/// Renders the one canonical text of a program.
///
/// Module line first, then the imports sorted by full path with exact
/// duplicates collapsed, then every other declaration in source order. Groups
/// and declarations are separated by exactly one blank line.
pub fn format_program(program: &Program) -> String {
    let mut sections: Vec<String> = Vec::new();

    let mut modules = String::new();
    for decl in &program.decls {
        if let Decl::Module(m) = decl {
            modules.push_str("module ");
            modules.push_str(&m.name());
            modules.push('\n');
        }
    }
    if !modules.is_empty() {
        sections.push(modules);
    }

    let mut uses: Vec<&UseDecl> = program
        .decls
        .iter()
        .filter_map(|d| match d {
            Decl::Use(u) => Some(u),
            _ => None,
        })
        .collect();
    uses.sort_by_key(|u| u.full_path());
    uses.dedup_by_key(|u| u.full_path());
    if !uses.is_empty() {
        let mut imports = String::new();
        for u in uses {
            imports.push_str("use ");
            imports.push_str(&u.full_path());
            imports.push('\n');
        }
        sections.push(imports);
    }

    for decl in &program.decls {
        let mut out = String::new();
        match decl {
            Decl::Module(_) | Decl::Use(_) => continue,
            Decl::Type(t) => fmt_type_decl(&mut out, t),
            Decl::Fn(f) => fmt_fn_decl(&mut out, f),
            Decl::Test(t) => fmt_test_decl(&mut out, t),
        }
        sections.push(out);
    }

    sections.join("\n")
}

pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    fmt_expr(&mut out, expr, Prec::Lowest);
    out
}

fn fmt_type_decl(out: &mut String, t: &TypeDecl) {
    out.push_str("type ");
    out.push_str(&t.name.node);
    if !t.params.is_empty() {
        out.push('<');
        for (i, p) in t.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&p.node);
        }
        out.push('>');
    }
    out.push_str(" = ");

    match &t.shape {
        Shape::Product(fields) => {
            out.push('{');
            for (i, f) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&f.name.node);
                out.push(':');
                fmt_type_ref(out, &f.ty);
            }
            out.push('}');
        }
        Shape::Sum(variants) => {
            for (i, v) in variants.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                out.push_str(&v.name.node);
                if !v.payload.is_empty() {
                    out.push('(');
                    for (j, ty) in v.payload.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        fmt_type_ref(out, ty);
                    }
                    out.push(')');
                }
            }
        }
    }
    out.push('\n');
}

fn fmt_fn_decl(out: &mut String, f: &FnDecl) {
    out.push_str("fn ");
    out.push_str(&f.name.node);
    out.push('(');
    for (i, p) in f.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&p.name.node);
        if p.mutable {
            out.push('!');
        }
        out.push(':');
        fmt_type_ref(out, &p.ty);
    }
    out.push_str("):");
    fmt_type_ref(out, &f.ret);
    out.push_str(" =\n");
    fmt_block_indent(out, 1, &f.body);
}

fn fmt_test_decl(out: &mut String, t: &TestDecl) {
    out.push_str("test ");
    out.push_str(&t.name.node);
    out.push_str(" =\n");
    fmt_block_indent(out, 1, &t.body);
}

fn fmt_block_indent(out: &mut String, indent: usize, block: &Block) {
    for stmt in &block.stmts {
        indent_line(out, indent);
        fmt_stmt(out, stmt);
        out.push('\n');
    }
}

fn fmt_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Decl(s) => {
            out.push_str(&s.name.node);
            if s.mutable {
                out.push('!');
            }
            out.push(':');
            fmt_type_ref(out, &s.ty);
            out.push_str(" = ");
            fmt_expr(out, &s.expr, Prec::Lowest);
        }
        Stmt::Assign(s) => {
            out.push_str(&s.target.node);
            out.push_str(" = ");
            fmt_expr(out, &s.expr, Prec::Lowest);
        }
        Stmt::Return(s) => {
            out.push('^');
            if let Some(e) = &s.expr {
                fmt_expr(out, e, Prec::Lowest);
            }
        }
        Stmt::Panic(s) => {
            out.push_str("panic!");
            if let Some(msg) = &s.message {
                out.push('(');
                fmt_string_lit(out, msg);
                out.push(')');
            }
        }
        Stmt::Guard(s) => {
            fmt_expr(out, &s.cond, Prec::Lowest);
            out.push_str(" ? ");
            fmt_stmt(out, &s.action);
        }
        Stmt::Match(s) => {
            fmt_expr(out, &s.scrutinee, Prec::Lowest);
            for arm in &s.arms {
                out.push_str(" | ");
                fmt_pattern(out, &arm.pat);
                out.push_str(" -> ");
                fmt_stmt(out, &arm.action);
            }
        }
        Stmt::Expr(e) => fmt_expr(out, e, Prec::Lowest),
    }
}

fn fmt_pattern(out: &mut String, pat: &Pattern) {
    match pat {
        Pattern::Wildcard { .. } => out.push('_'),
        Pattern::Binding(id) => out.push_str(&id.node),
        Pattern::Ctor {
            variant,
            subpatterns,
            ..
        } => {
            out.push_str(&variant.node);
            if !subpatterns.is_empty() {
                out.push('(');
                for (i, p) in subpatterns.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    fmt_pattern(out, p);
                }
                out.push(')');
            }
        }
    }
}

fn fmt_type_ref(out: &mut String, t: &TypeRef) {
    out.push_str(&t.name.node);
    if !t.args.is_empty() {
        out.push('<');
        for (i, a) in t.args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            fmt_type_ref(out, a);
        }
        out.push('>');
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,
    Or,
    And,
    Cmp,
    Add,
    Mul,
    Unary,
    Postfix,
    Primary,
}

impl Prec {
    fn tighter(self) -> Prec {
        match self {
            Prec::Lowest => Prec::Or,
            Prec::Or => Prec::And,
            Prec::And => Prec::Cmp,
            Prec::Cmp => Prec::Add,
            Prec::Add => Prec::Mul,
            Prec::Mul => Prec::Unary,
            Prec::Unary => Prec::Postfix,
            Prec::Postfix | Prec::Primary => Prec::Primary,
        }
    }
}

fn bin_prec(op: BinOp) -> Prec {
    match op {
        BinOp::Or => Prec::Or,
        BinOp::And => Prec::And,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => Prec::Cmp,
        BinOp::Add | BinOp::Sub => Prec::Add,
        BinOp::Mul | BinOp::Div | BinOp::Rem => Prec::Mul,
    }
}

fn needs_parens(parent: Prec, child: Prec) -> bool {
    child < parent
}

fn fmt_expr(out: &mut String, expr: &Expr, parent_prec: Prec) {
    match &expr.kind {
        ExprKind::Ident(id) => out.push_str(&id.node),
        ExprKind::IntLit(n) => out.push_str(&n.to_string()),
        ExprKind::FloatLit(f) => out.push_str(&format!("{f:?}")),
        ExprKind::BoolLit(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::StringLit(s) => fmt_string_lit(out, s),
        ExprKind::UnitLit => out.push_str("()"),
        ExprKind::VariantCtor { variant, args } => {
            out.push_str(&variant.node);
            match args.as_slice() {
                [] => {}
                [
                    Expr {
                        kind: ExprKind::StringLit(s),
                        ..
                    },
                ] => {
                    out.push('.');
                    fmt_string_lit(out, s);
                }
                _ => {
                    out.push_str(".(");
                    fmt_expr_list(out, args);
                    out.push(')');
                }
            }
        }
        ExprKind::RecordLit { name, fields } => {
            out.push_str(&name.node);
            out.push_str(".{");
            for (i, (k, v)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&k.node);
                out.push(':');
                fmt_expr(out, v, Prec::Lowest);
            }
            out.push('}');
        }
        ExprKind::Unary { op, expr: inner } => {
            let my = Prec::Unary;
            let parens = needs_parens(parent_prec, my);
            if parens {
                out.push('(');
            }
            match op {
                UnaryOp::Neg => out.push('-'),
                UnaryOp::Not => out.push('!'),
            }
            fmt_expr(out, inner, my);
            if parens {
                out.push(')');
            }
        }
        ExprKind::Binary { left, op, right } => {
            let my = bin_prec(*op);
            let parens = needs_parens(parent_prec, my);
            if parens {
                out.push('(');
            }
            // Left-associative; comparisons do not chain at all.
            let left_prec = if my == Prec::Cmp { my.tighter() } else { my };
            fmt_expr(out, left, left_prec);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            fmt_expr(out, right, my.tighter());
            if parens {
                out.push(')');
            }
        }
        ExprKind::Field { base, field } => {
            let my = Prec::Postfix;
            let parens = needs_parens(parent_prec, my);
            if parens {
                out.push('(');
            }
            // A bare nullary constructor would swallow the dot.
            let bare_ctor =
                matches!(&base.kind, ExprKind::VariantCtor { args, .. } if args.is_empty());
            if bare_ctor {
                out.push('(');
            }
            fmt_expr(out, base, my);
            if bare_ctor {
                out.push(')');
            }
            out.push('.');
            out.push_str(&field.node);
            if parens {
                out.push(')');
            }
        }
        ExprKind::Call { callee, args } => {
            out.push_str(&callee.node);
            out.push('(');
            fmt_expr_list(out, args);
            out.push(')');
        }
    }
}

fn fmt_expr_list(out: &mut String, args: &[Expr]) {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        fmt_expr(out, a, Prec::Lowest);
    }
}

fn fmt_string_lit(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other if other.is_control() => {
                let cp = other as u32;
                out.push_str(&format!("\\u{{{:x}}}", cp));
            }
            other => out.push(other),
        }
    }
    out.push('"');
}

fn indent_line(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}
