#![forbid(unsafe_code)]

use ail_ast::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwModule,
    KwUse,
    KwType,
    KwFn,
    KwTest,
    KwTrue,
    KwFalse,
    KwPanic,

    // Operators / punctuation
    Arrow,
    ColonColon,
    Colon,
    Eq,
    EqEq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    AndAnd,
    OrOr,
    Pipe,
    Bang,
    Question,
    Caret,
    Dot,
    Comma,

    LParen,
    RParen,
    LBrace,
    RBrace,

    Newline,
    Indent,
    Dedent,
    Eof,

    // Literals / identifiers
    Ident(String),
    Int(u64),
    Float(f64),
    String(String),
}
