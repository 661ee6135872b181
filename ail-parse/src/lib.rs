#![forbid(unsafe_code)]

mod diff;
mod error;
mod fmt;
mod parser;

use ail_lex::Lexer;
use miette::IntoDiagnostic;

pub use diff::{DiffLine, line_diff, render_diff};
pub use error::ParseError;
pub use fmt::{format_expr, format_program};
pub use parser::Parser;

/// The only edition this parser accepts.
pub const SUPPORTED_EDITION: &str = "v0";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Language edition (e.g. "v0"). `None` means the current edition.
    pub edition: Option<String>,
}

pub fn parse_source(src: &str) -> miette::Result<ail_ast::Program> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_program().into_diagnostic()
}

pub fn parse_source_with_config(src: &str, config: &ParseConfig) -> miette::Result<ail_ast::Program> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new_with_config(&tokens, config);
    parser.parse_program().into_diagnostic()
}

pub fn parse_expr(src: &str) -> miette::Result<ail_ast::Expr> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_expr_eof().into_diagnostic()
}

/// Outcome of comparing raw text against its canonical rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatCheck {
    Canonical,
    NotCanonical {
        /// The canonical text the source should have been.
        formatted: String,
        diff: Vec<DiffLine>,
    },
}

impl FormatCheck {
    pub fn is_canonical(&self) -> bool {
        matches!(self, FormatCheck::Canonical)
    }
}

/// Parses `src`, formats it in memory and compares byte for byte.
pub fn check_format(src: &str) -> miette::Result<FormatCheck> {
    let program = parse_source(src)?;
    Ok(check_program_format(src, &program))
}

/// Compares `src` with the canonical rendering of `program`, already parsed
/// from it.
pub fn check_program_format(src: &str, program: &ail_ast::Program) -> FormatCheck {
    let formatted = format_program(program);
    if formatted == src {
        return FormatCheck::Canonical;
    }
    let diff = line_diff(src, &formatted);
    FormatCheck::NotCanonical { formatted, diff }
}
