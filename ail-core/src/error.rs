#![forbid(unsafe_code)]

use std::fmt;

use ail_ast::Span;
use miette::LabeledSpan;
use thiserror::Error;

/// Every fact the verifier can report about a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    DuplicateModule,
    UnresolvedImport,
    ImportNameCollision,
    UnresolvedName,
    DuplicateBinding,
    TypeMismatch,
    UnknownType,
    ArityMismatch,
    NoImplicitCoercion,
    UseAfterMove,
    InvalidFieldAccessOnMove,
    /// Part of the taxonomy for consumers; never produced, since records only
    /// move whole and Move-typed field access is `InvalidFieldAccessOnMove`.
    PartialMove,
    NonExhaustiveMatch,
    IncompleteReturnCoverage,
    NotCanonical,
    ImmutableAssignment,
    CyclicImport,
    ReachableFault,
    UnreachableArm,
    UnreachableStatement,
}

impl ErrorKind {
    pub fn default_severity(self) -> Severity {
        match self {
            ErrorKind::NotCanonical => Severity::Info,
            ErrorKind::UnreachableArm
            | ErrorKind::UnreachableStatement
            | ErrorKind::ReachableFault => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable diagnostic code suffix, e.g. `use_after_move`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DuplicateModule => "duplicate_module",
            ErrorKind::UnresolvedImport => "unresolved_import",
            ErrorKind::ImportNameCollision => "import_name_collision",
            ErrorKind::UnresolvedName => "unresolved_name",
            ErrorKind::DuplicateBinding => "duplicate_binding",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::UnknownType => "unknown_type",
            ErrorKind::ArityMismatch => "arity_mismatch",
            ErrorKind::NoImplicitCoercion => "no_implicit_coercion",
            ErrorKind::UseAfterMove => "use_after_move",
            ErrorKind::InvalidFieldAccessOnMove => "invalid_field_access_on_move",
            ErrorKind::PartialMove => "partial_move",
            ErrorKind::NonExhaustiveMatch => "non_exhaustive_match",
            ErrorKind::IncompleteReturnCoverage => "incomplete_return_coverage",
            ErrorKind::NotCanonical => "not_canonical",
            ErrorKind::ImmutableAssignment => "immutable_assignment",
            ErrorKind::CyclicImport => "cyclic_import",
            ErrorKind::ReachableFault => "reachable_fault",
            ErrorKind::UnreachableArm => "unreachable_arm",
            ErrorKind::UnreachableStatement => "unreachable_statement",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One located finding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Name of the enclosing declaration, when there is one.
    pub decl: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            span,
            decl: None,
        }
    }

    pub fn in_decl(mut self, decl: Option<&str>) -> Self {
        self.decl = decl.map(str::to_string);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn sort_key(&self) -> (usize, usize, ErrorKind) {
        (self.span.offset(), self.span.len(), self.kind)
    }
}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("ail::{}", self.kind.code())))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Info => miette::Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let decl = self.decl.as_ref()?;
        Some(Box::new(format!("in `{decl}`")))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some(self.kind.to_string()), self.span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// An ordered diagnostic list for one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(other);
    }

    /// Sorts by source position; equal positions fall back to kind order.
    pub fn sort(&mut self) {
        self.items.sort_by_key(|d| d.sort_key());
        self.items.dedup();
    }

    pub fn retain(&mut self, keep: impl FnMut(&Diagnostic) -> bool) {
        self.items.retain(keep);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.items.iter().map(|d| d.kind).collect()
    }

    pub fn has(&self, kind: ErrorKind) -> bool {
        self.items.iter().any(|d| d.kind == kind)
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl miette::Diagnostic for Diagnostics {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("ail::verify"))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn miette::Diagnostic> + 'a>> {
        Some(Box::new(
            self.items.iter().map(|d| d as &dyn miette::Diagnostic),
        ))
    }
}
