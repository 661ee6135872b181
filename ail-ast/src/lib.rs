#![forbid(unsafe_code)]

use miette::SourceSpan;

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            node: f(self.node),
        }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

pub type Ident = Spanned<String>;

/// Capitalized identifiers name types and variants.
pub fn is_type_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Name of the unit type, both as a type reference and as a literal.
pub const UNIT_NAME: &str = "()";

/// One compilation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Module(ModuleDecl),
    Use(UseDecl),
    Type(TypeDecl),
    Fn(FnDecl),
    Test(TestDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Module(d) => d.span,
            Decl::Use(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Fn(d) => d.span,
            Decl::Test(d) => d.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleDecl {
    pub span: Span,
    pub path: Vec<Ident>,
}

impl ModuleDecl {
    pub fn name(&self) -> String {
        join_path(&self.path)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UseDecl {
    pub span: Span,
    pub path: Vec<Ident>,
}

impl UseDecl {
    /// Full `::`-joined path, the sort key of canonical import order.
    pub fn full_path(&self) -> String {
        join_path(&self.path)
    }

    /// Every segment but the last.
    pub fn module_path(&self) -> String {
        let n = self.path.len().saturating_sub(1);
        join_path(&self.path[..n])
    }

    pub fn item(&self) -> Option<&Ident> {
        self.path.last()
    }
}

pub fn join_path(path: &[Ident]) -> String {
    path.iter()
        .map(|seg| seg.node.as_str())
        .collect::<Vec<_>>()
        .join("::")
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Ident>,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Product(Vec<FieldDef>),
    Sum(Vec<VariantDef>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantDef {
    pub span: Span,
    pub name: Ident,
    pub payload: Vec<TypeRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FnDecl {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: TypeRef,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestDecl {
    pub span: Span,
    pub name: Ident,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub span: Span,
    pub name: Ident,
    pub mutable: bool,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub span: Span,
    pub name: Ident,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn unit(span: Span) -> Self {
        Self {
            span,
            name: Ident::new(span, UNIT_NAME.to_string()),
            args: Vec::new(),
        }
    }

    pub fn is_unit(&self) -> bool {
        self.name.node == UNIT_NAME && self.args.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Decl(DeclStmt),
    Assign(AssignStmt),
    Return(ReturnStmt),
    Guard(GuardStmt),
    Match(MatchStmt),
    Expr(Expr),
    Panic(PanicStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Guard(s) => s.span,
            Stmt::Match(s) => s.span,
            Stmt::Expr(e) => e.span,
            Stmt::Panic(s) => s.span,
        }
    }

    /// Return and Panic end the path they are on.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Stmt::Return(_) | Stmt::Panic(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclStmt {
    pub span: Span,
    pub name: Ident,
    pub mutable: bool,
    pub ty: TypeRef,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub span: Span,
    pub target: Ident,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub span: Span,
    pub expr: Option<Expr>,
}

/// `cond ? action`
#[derive(Clone, Debug, PartialEq)]
pub struct GuardStmt {
    pub span: Span,
    pub cond: Expr,
    pub action: Box<Stmt>,
}

/// `scrutinee | pat -> action | pat -> action`
#[derive(Clone, Debug, PartialEq)]
pub struct MatchStmt {
    pub span: Span,
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub span: Span,
    pub pat: Pattern,
    pub action: Box<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanicStmt {
    pub span: Span,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Wildcard { span: Span },
    Binding(Ident),
    Ctor {
        span: Span,
        variant: Ident,
        subpatterns: Vec<Pattern>,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard { span } => *span,
            Pattern::Binding(id) => id.span,
            Pattern::Ctor { span, .. } => *span,
        }
    }

    /// Wildcards and variables match every value.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Pattern::Wildcard { .. } | Pattern::Binding(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    IntLit(u64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    UnitLit,
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `base.field`
    Field {
        base: Box<Expr>,
        field: Ident,
    },
    Call {
        callee: Ident,
        args: Vec<Expr>,
    },
    /// `Variant.(a, b)`, `Variant."text"`, or a bare nullary `Variant`.
    VariantCtor {
        variant: Ident,
        args: Vec<Expr>,
    },
    /// `Type.{field:value, ...}`
    RecordLit {
        name: Ident,
        fields: Vec<(Ident, Expr)>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}
