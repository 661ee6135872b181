#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use ail_ast::{Span, span_between};
use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
#[error("lex error: {message}")]
#[diagnostic(code(ail::lex))]
#[allow(unused_assignments)]
pub struct LexError {
    pub message: String,
    #[label]
    pub span: Span,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \f\r]+")]
enum RawToken {
    #[token("module")]
    KwModule,
    #[token("use")]
    KwUse,
    #[token("type")]
    KwType,
    #[token("fn")]
    KwFn,
    #[token("test")]
    KwTest,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("panic!")]
    KwPanic,

    #[token("->")]
    Arrow,
    #[token("::")]
    ColonColon,

    #[token("==")]
    EqEq,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("^")]
    Caret,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token(",")]
    Comma,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| parse_float(lex.slice()))]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| parse_float(lex.slice()))]
    Float(Option<f64>),

    #[regex(r"[0-9][0-9_]*", |lex| parse_int_decimal(lex.slice()))]
    Int(Option<u64>),

    // String literals: "..." with a strict set of escapes.
    // Supported: \n, \t, \r, \", \\, and \u{HEX} (1-6 hex digits)
    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    String(Option<String>),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn parse_int_decimal(s: &str) -> Option<u64> {
    if s.ends_with('_') || s.contains("__") {
        return None;
    }
    s.replace('_', "").parse::<u64>().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_string(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let esc = chars.next()?;
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'u' => {
                if chars.next() != Some('{') {
                    return None;
                }
                let mut hex = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        break;
                    }
                    hex.push(ch);
                    chars.next();
                    if hex.len() > 6 {
                        return None;
                    }
                }
                if chars.next() != Some('}') || hex.is_empty() {
                    return None;
                }
                let cp = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(cp)?);
            }
            _ => return None,
        }
    }

    Some(out)
}

fn convert(raw: RawToken) -> Result<TokenKind, &'static str> {
    let kind = match raw {
        RawToken::KwModule => TokenKind::KwModule,
        RawToken::KwUse => TokenKind::KwUse,
        RawToken::KwType => TokenKind::KwType,
        RawToken::KwFn => TokenKind::KwFn,
        RawToken::KwTest => TokenKind::KwTest,
        RawToken::KwTrue => TokenKind::KwTrue,
        RawToken::KwFalse => TokenKind::KwFalse,
        RawToken::KwPanic => TokenKind::KwPanic,

        RawToken::Arrow => TokenKind::Arrow,
        RawToken::ColonColon => TokenKind::ColonColon,

        RawToken::EqEq => TokenKind::EqEq,
        RawToken::Neq => TokenKind::Neq,
        RawToken::Le => TokenKind::Le,
        RawToken::Ge => TokenKind::Ge,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,

        RawToken::AndAnd => TokenKind::AndAnd,
        RawToken::OrOr => TokenKind::OrOr,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Question => TokenKind::Question,
        RawToken::Caret => TokenKind::Caret,

        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,

        RawToken::Dot => TokenKind::Dot,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Comma => TokenKind::Comma,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,

        RawToken::Ident(s) => TokenKind::Ident(s),
        RawToken::Int(Some(n)) => TokenKind::Int(n),
        RawToken::Int(None) => return Err("invalid integer literal"),
        RawToken::Float(Some(f)) => TokenKind::Float(f),
        RawToken::Float(None) => return Err("invalid float literal"),
        RawToken::String(Some(s)) => TokenKind::String(s),
        RawToken::String(None) => return Err("invalid string literal"),
    };
    Ok(kind)
}

pub struct Lexer<'a> {
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    /// Lexes the whole unit into a flat token stream with layout tokens.
    ///
    /// Every non-blank line ends in `Newline`; a deeper indentation than the
    /// enclosing line opens an `Indent`, and returning to an outer level emits
    /// one `Dedent` per closed level.
    pub fn lex(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut indent_stack: Vec<usize> = vec![0];

        // Track absolute byte offsets.
        let mut line_start = 0usize;

        for line in self.src.split_inclusive('\n') {
            let line_end = line_start + line.len();
            let content = line.strip_suffix('\n').unwrap_or(line);

            if content.trim().is_empty() {
                line_start = line_end;
                continue;
            }

            if content.contains('\t') {
                return Err(LexError {
                    message: "tabs are not allowed; use spaces".to_string(),
                    span: span_between(line_start, line_end),
                });
            }

            let leading_spaces = content.bytes().take_while(|b| *b == b' ').count();

            let current_indent = indent_stack.last().copied().unwrap_or(0);
            if leading_spaces > current_indent {
                indent_stack.push(leading_spaces);
                tokens.push(Token {
                    kind: TokenKind::Indent,
                    span: span_between(line_start, line_start + leading_spaces),
                });
            } else if leading_spaces < current_indent {
                while let Some(&top) = indent_stack.last() {
                    if leading_spaces >= top {
                        break;
                    }
                    indent_stack.pop();
                    tokens.push(Token {
                        kind: TokenKind::Dedent,
                        span: span_between(line_start, line_start + leading_spaces),
                    });
                }
                if indent_stack.last().copied() != Some(leading_spaces) {
                    return Err(LexError {
                        message: "inconsistent indentation".to_string(),
                        span: span_between(line_start, line_end),
                    });
                }
            }

            let code = &content[leading_spaces..];
            let base = line_start + leading_spaces;
            let mut lex = RawToken::lexer(code);
            while let Some(raw) = lex.next() {
                let range = lex.span();
                let span = span_between(base + range.start, base + range.end);
                let kind = match raw {
                    Ok(raw) => convert(raw).map_err(|message| LexError {
                        message: message.to_string(),
                        span,
                    })?,
                    Err(()) => {
                        return Err(LexError {
                            message: "unexpected token".to_string(),
                            span,
                        });
                    }
                };
                tokens.push(Token { kind, span });
            }

            // End of logical line.
            tokens.push(Token {
                kind: TokenKind::Newline,
                span: span_between(base + code.len(), base + code.len()),
            });

            line_start = line_end;
        }

        // Close open indents.
        let eof = span_between(self.src.len(), self.src.len());
        while indent_stack.len() > 1 {
            indent_stack.pop();
            tokens.push(Token {
                kind: TokenKind::Dedent,
                span: eof,
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: eof,
        });

        Ok(tokens)
    }
}
