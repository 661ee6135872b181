#![forbid(unsafe_code)]

use std::mem;

use ail_ast::{
    AssignStmt, BinOp, Block, Decl, DeclStmt, Expr, ExprKind, FieldDef, FnDecl, GuardStmt, Ident,
    MatchArm, MatchStmt, ModuleDecl, PanicStmt, Param, Pattern, Program, ReturnStmt, Shape, Span,
    Stmt, TestDecl, TypeDecl, TypeRef, UnaryOp, UseDecl, VariantDef, is_type_name, span_between,
};
use ail_lex::{Token, TokenKind};

use crate::error::ParseError;
use crate::{ParseConfig, SUPPORTED_EDITION};

pub struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    config: ParseConfig,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            idx: 0,
            config: ParseConfig::default(),
        }
    }

    pub fn new_with_config(tokens: &'a [Token], config: &ParseConfig) -> Self {
        Self {
            tokens,
            idx: 0,
            config: config.clone(),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        if let Some(edition) = &self.config.edition {
            if edition != SUPPORTED_EDITION {
                return Err(ParseError {
                    message: format!(
                        "unsupported edition '{edition}' (expected '{SUPPORTED_EDITION}')"
                    ),
                    span: span_between(0, 0),
                });
            }
        }

        let mut decls = Vec::new();
        while !self.at(TokenKind::Eof) {
            self.skip_newlines();
            if self.at(TokenKind::Eof) {
                break;
            }
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::KwModule) => {
                let start = self.expect(TokenKind::KwModule)?;
                let path = self.parse_path()?;
                let span = join(start.span, path_span(&path, start.span));
                self.expect_line_end()?;
                Ok(Decl::Module(ModuleDecl { span, path }))
            }
            Some(TokenKind::KwUse) => {
                let start = self.expect(TokenKind::KwUse)?;
                let path = self.parse_path()?;
                let span = join(start.span, path_span(&path, start.span));
                self.expect_line_end()?;
                Ok(Decl::Use(UseDecl { span, path }))
            }
            Some(TokenKind::KwType) => {
                let decl = self.parse_type_decl()?;
                self.expect_line_end()?;
                Ok(Decl::Type(decl))
            }
            Some(TokenKind::KwFn) => Ok(Decl::Fn(self.parse_fn_decl()?)),
            Some(TokenKind::KwTest) => Ok(Decl::Test(self.parse_test_decl()?)),
            Some(TokenKind::Indent) => Err(ParseError {
                message: "unexpected indentation at top level".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(0, 0)),
            }),
            _ => Err(ParseError {
                message: "expected `module`, `use`, `type`, `fn` or `test`".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(0, 0)),
            }),
        }
    }

    fn parse_path(&mut self) -> Result<Vec<Ident>, ParseError> {
        let mut path = vec![self.expect_ident()?];
        while self.at(TokenKind::ColonColon) || self.at(TokenKind::Dot) {
            self.next();
            path.push(self.expect_ident()?);
        }
        Ok(path)
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let start = self.expect(TokenKind::KwType)?;
        let name = self.expect_type_name()?;

        let mut params = Vec::new();
        if self.at(TokenKind::Lt) {
            self.next();
            loop {
                params.push(self.expect_type_name()?);
                if self.at(TokenKind::Comma) {
                    self.next();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::Gt)?;
        }

        self.expect(TokenKind::Eq)?;

        let (shape, end) = if self.at(TokenKind::LBrace) {
            self.next();
            let mut fields = Vec::new();
            while !self.at(TokenKind::RBrace) {
                let fname = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type_ref()?;
                let span = join(fname.span, ty.span);
                fields.push(FieldDef {
                    span,
                    name: fname,
                    ty,
                });
                if self.at(TokenKind::Comma) {
                    self.next();
                } else {
                    break;
                }
            }
            let end = self.expect(TokenKind::RBrace)?;
            (Shape::Product(fields), end.span)
        } else {
            let mut variants = vec![self.parse_variant_def()?];
            while self.at(TokenKind::Pipe) {
                self.next();
                variants.push(self.parse_variant_def()?);
            }
            let end = variants.last().map(|v| v.span).unwrap_or(start.span);
            (Shape::Sum(variants), end)
        };

        Ok(TypeDecl {
            span: join(start.span, end),
            name,
            params,
            shape,
        })
    }

    fn parse_variant_def(&mut self) -> Result<VariantDef, ParseError> {
        let name = self.expect_type_name()?;
        let mut span = name.span;
        let mut payload = Vec::new();
        if self.at(TokenKind::LParen) {
            self.next();
            while !self.at(TokenKind::RParen) {
                payload.push(self.parse_type_ref()?);
                if self.at(TokenKind::Comma) {
                    self.next();
                } else {
                    break;
                }
            }
            let end = self.expect(TokenKind::RParen)?;
            span = join(span, end.span);
        }
        Ok(VariantDef {
            span,
            name,
            payload,
        })
    }

    fn parse_fn_decl(&mut self) -> Result<FnDecl, ParseError> {
        let start = self.expect(TokenKind::KwFn)?;
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        self.expect(TokenKind::Colon)?;
        let ret = self.parse_type_ref()?;
        self.expect(TokenKind::Eq)?;
        let body = self.parse_body(ret.span)?;
        Ok(FnDecl {
            span: join(start.span, body.span),
            name,
            params,
            ret,
            body,
        })
    }

    fn parse_test_decl(&mut self) -> Result<TestDecl, ParseError> {
        let start = self.expect(TokenKind::KwTest)?;
        let name = self.expect_ident()?;
        let eq = self.expect(TokenKind::Eq)?;
        let body = self.parse_body(eq.span)?;
        Ok(TestDecl {
            span: join(start.span, body.span),
            name,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let name = self.expect_ident()?;
            let mutable = self.eat(TokenKind::Bang);
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_ref()?;
            params.push(Param {
                span: join(name.span, ty.span),
                name,
                mutable,
                ty,
            });
            if self.at(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Either a single statement on the header line or an indented block.
    fn parse_body(&mut self, header: Span) -> Result<Block, ParseError> {
        if !self.at(TokenKind::Newline) {
            let stmt = self.parse_stmt()?;
            self.expect_line_end()?;
            return Ok(Block {
                span: stmt.span(),
                stmts: vec![stmt],
            });
        }

        self.expect(TokenKind::Newline)?;
        if !self.at(TokenKind::Indent) {
            return Err(ParseError {
                message: "expected an indented body".to_string(),
                span: self.peek_span().unwrap_or(header),
            });
        }
        self.next();

        let mut stmts = Vec::new();
        while !self.at(TokenKind::Dedent) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Indent) {
                return Err(ParseError {
                    message: "nested indentation is not allowed inside a body".to_string(),
                    span: self.peek_span().unwrap_or(header),
                });
            }
            stmts.push(self.parse_stmt()?);
            self.expect_line_end()?;
        }
        self.expect(TokenKind::Dedent)?;

        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => join(first.span(), last.span()),
            _ => header,
        };
        Ok(Block { span, stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match (self.peek_kind(), self.peek_kind_n(1)) {
            (Some(TokenKind::Caret), _) => return Ok(Stmt::Return(self.parse_return()?)),
            (Some(TokenKind::KwPanic), _) => return Ok(Stmt::Panic(self.parse_panic()?)),
            (Some(TokenKind::Ident(_)), Some(TokenKind::Bang | TokenKind::Colon)) => {
                return Ok(Stmt::Decl(self.parse_decl_stmt()?));
            }
            (Some(TokenKind::Ident(_)), Some(TokenKind::Eq)) => {
                return Ok(Stmt::Assign(self.parse_assign()?));
            }
            _ => {}
        }

        let expr = self.parse_expr()?;
        if self.at(TokenKind::Question) {
            self.next();
            let action = self.parse_action()?;
            return Ok(Stmt::Guard(GuardStmt {
                span: join(expr.span, action.span()),
                cond: expr,
                action: Box::new(action),
            }));
        }

        if self.at(TokenKind::Pipe) {
            let mut arms = Vec::new();
            while self.at(TokenKind::Pipe) {
                self.next();
                let pat = self.parse_pattern()?;
                self.expect(TokenKind::Arrow)?;
                let action = self.parse_action()?;
                arms.push(MatchArm {
                    span: join(pat.span(), action.span()),
                    pat,
                    action: Box::new(action),
                });
            }
            let end = arms.last().map(|a| a.span).unwrap_or(expr.span);
            return Ok(Stmt::Match(MatchStmt {
                span: join(expr.span, end),
                scrutinee: expr,
                arms,
            }));
        }

        Ok(Stmt::Expr(expr))
    }

    /// The statement form allowed after `?` and `->`.
    fn parse_action(&mut self) -> Result<Stmt, ParseError> {
        match (self.peek_kind(), self.peek_kind_n(1)) {
            (Some(TokenKind::Caret), _) => Ok(Stmt::Return(self.parse_return()?)),
            (Some(TokenKind::KwPanic), _) => Ok(Stmt::Panic(self.parse_panic()?)),
            (Some(TokenKind::Ident(_)), Some(TokenKind::Eq)) => {
                Ok(Stmt::Assign(self.parse_assign()?))
            }
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn parse_decl_stmt(&mut self) -> Result<DeclStmt, ParseError> {
        let name = self.expect_ident()?;
        let mutable = self.eat(TokenKind::Bang);
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type_ref()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(DeclStmt {
            span: join(name.span, expr.span),
            name,
            mutable,
            ty,
            expr,
        })
    }

    fn parse_assign(&mut self) -> Result<AssignStmt, ParseError> {
        let target = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(AssignStmt {
            span: join(target.span, expr.span),
            target,
            expr,
        })
    }

    fn parse_return(&mut self) -> Result<ReturnStmt, ParseError> {
        let start = self.expect(TokenKind::Caret)?;
        if matches!(
            self.peek_kind(),
            None | Some(TokenKind::Newline | TokenKind::Pipe | TokenKind::Dedent | TokenKind::Eof)
        ) {
            return Ok(ReturnStmt {
                span: start.span,
                expr: None,
            });
        }
        let expr = self.parse_expr()?;
        Ok(ReturnStmt {
            span: join(start.span, expr.span),
            expr: Some(expr),
        })
    }

    fn parse_panic(&mut self) -> Result<PanicStmt, ParseError> {
        let start = self.expect(TokenKind::KwPanic)?;
        if !self.at(TokenKind::LParen) {
            return Ok(PanicStmt {
                span: start.span,
                message: None,
            });
        }
        self.next();
        let tok = self.expect_any()?;
        let TokenKind::String(message) = tok.kind else {
            return Err(ParseError {
                message: "expected a string message in `panic!(...)`".to_string(),
                span: tok.span,
            });
        };
        let end = self.expect(TokenKind::RParen)?;
        Ok(PanicStmt {
            span: join(start.span, end.span),
            message: Some(message),
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let id = self.expect_ident()?;
        if id.node == "_" {
            return Ok(Pattern::Wildcard { span: id.span });
        }
        if !is_type_name(&id.node) {
            return Ok(Pattern::Binding(id));
        }

        let mut span = id.span;
        let mut subpatterns = Vec::new();
        if self.at(TokenKind::LParen) {
            self.next();
            while !self.at(TokenKind::RParen) {
                subpatterns.push(self.parse_pattern()?);
                if self.at(TokenKind::Comma) {
                    self.next();
                } else {
                    break;
                }
            }
            let end = self.expect(TokenKind::RParen)?;
            span = join(span, end.span);
        }
        Ok(Pattern::Ctor {
            span,
            variant: id,
            subpatterns,
        })
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        if self.at(TokenKind::LParen) {
            let open = self.expect(TokenKind::LParen)?;
            let close = self.expect(TokenKind::RParen)?;
            return Ok(TypeRef::unit(join(open.span, close.span)));
        }

        let name = self.expect_ident()?;
        let mut span = name.span;
        let mut args = Vec::new();
        if self.at(TokenKind::Lt) {
            self.next();
            loop {
                args.push(self.parse_type_ref()?);
                if self.at(TokenKind::Comma) {
                    self.next();
                    continue;
                }
                break;
            }
            let end = self.expect(TokenKind::Gt)?;
            span = join(span, end.span);
        }
        Ok(TypeRef { span, name, args })
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expr()
    }

    pub fn parse_expr_eof(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        self.skip_newlines();
        if !self.at(TokenKind::Eof) {
            return Err(ParseError {
                message: "unexpected tokens after expression".to_string(),
                span: self.peek_span().unwrap_or(expr.span),
            });
        }
        Ok(expr)
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.at(TokenKind::OrOr) {
            self.next();
            let right = self.parse_and_expr()?;
            left = binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_cmp_expr()?;
        while self.at(TokenKind::AndAnd) {
            self.next();
            let right = self.parse_cmp_expr()?;
            left = binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_cmp_expr(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_add_expr()?;
        let Some(op) = self.peek_kind().and_then(cmp_op) else {
            return Ok(left);
        };
        self.next();
        let right = self.parse_add_expr()?;
        let expr = binary(left, op, right);

        if self.peek_kind().and_then(cmp_op).is_some() {
            let span = self.peek_span().unwrap_or(expr.span);
            return Err(ParseError {
                message: "chained comparisons are not supported; use parentheses or `&&`"
                    .to_string(),
                span,
            });
        }

        Ok(expr)
    }

    fn parse_add_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.parse_mul_expr()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_mul_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Percent) => BinOp::Rem,
                _ => break,
            };
            self.next();
            let right = self.parse_unary_expr()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            _ => return self.parse_postfix_expr(),
        };
        let tok = self.expect_any()?;
        let expr = self.parse_unary_expr()?;
        Ok(Expr {
            span: join(tok.span, expr.span),
            kind: ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
        })
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            if self.at(TokenKind::Dot) {
                self.next();
                let field = self.expect_ident()?;
                expr = Expr {
                    span: join(expr.span, field.span),
                    kind: ExprKind::Field {
                        base: Box::new(expr),
                        field,
                    },
                };
                continue;
            }

            if self.at(TokenKind::LParen) {
                let ExprKind::Ident(callee) = &expr.kind else {
                    return Err(ParseError {
                        message: "only named functions can be called".to_string(),
                        span: expr.span,
                    });
                };
                let callee = callee.clone();
                let (args, end) = self.parse_args()?;
                expr = Expr {
                    span: join(expr.span, end),
                    kind: ExprKind::Call { callee, args },
                };
                continue;
            }

            break;
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<(Vec<Expr>, Span), ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if self.at(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RParen)?;
        Ok((args, end.span))
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let tok = self.expect_any()?;
        let kind = match tok.kind {
            TokenKind::Int(n) => ExprKind::IntLit(n),
            TokenKind::Float(f) => ExprKind::FloatLit(f),
            TokenKind::String(s) => ExprKind::StringLit(s),
            TokenKind::KwTrue => ExprKind::BoolLit(true),
            TokenKind::KwFalse => ExprKind::BoolLit(false),
            TokenKind::LParen => {
                if self.at(TokenKind::RParen) {
                    let end = self.expect(TokenKind::RParen)?;
                    return Ok(Expr {
                        span: join(tok.span, end.span),
                        kind: ExprKind::UnitLit,
                    });
                }
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::Ident(name) if is_type_name(&name) => {
                let name = Ident::new(tok.span, name);
                return self.parse_constructor(name);
            }
            TokenKind::Ident(name) => ExprKind::Ident(Ident::new(tok.span, name)),
            _ => {
                return Err(ParseError {
                    message: "expected expression".to_string(),
                    span: tok.span,
                });
            }
        };
        Ok(Expr {
            span: tok.span,
            kind,
        })
    }

    /// `V.(args)`, `V."text"`, `T.{f:e}` or a bare nullary `V`.
    fn parse_constructor(&mut self, name: Ident) -> Result<Expr, ParseError> {
        if !self.at(TokenKind::Dot) {
            return Ok(Expr {
                span: name.span,
                kind: ExprKind::VariantCtor {
                    variant: name,
                    args: Vec::new(),
                },
            });
        }
        self.next();

        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                let (args, end) = self.parse_args()?;
                Ok(Expr {
                    span: join(name.span, end),
                    kind: ExprKind::VariantCtor {
                        variant: name,
                        args,
                    },
                })
            }
            Some(TokenKind::String(_)) => {
                let tok = self.expect_any()?;
                let TokenKind::String(s) = tok.kind else {
                    unreachable!("peeked a string token");
                };
                let arg = Expr {
                    span: tok.span,
                    kind: ExprKind::StringLit(s),
                };
                Ok(Expr {
                    span: join(name.span, tok.span),
                    kind: ExprKind::VariantCtor {
                        variant: name,
                        args: vec![arg],
                    },
                })
            }
            Some(TokenKind::LBrace) => self.parse_record_lit(name),
            _ => Err(ParseError {
                message: format!("expected `(`, a string or `{{` after `{}.`", name.node),
                span: self.peek_span().unwrap_or(name.span),
            }),
        }
    }

    fn parse_record_lit(&mut self, name: Ident) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let field = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            fields.push((field, value));
            if self.at(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace)?;
        Ok(Expr {
            span: join(name.span, end.span),
            kind: ExprKind::RecordLit { name, fields },
        })
    }

    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.next();
        }
    }

    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        if self.at(TokenKind::Newline) {
            self.next();
            Ok(())
        } else if self.at(TokenKind::Eof) {
            Ok(())
        } else {
            Err(ParseError {
                message: "expected end of line".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(0, 0)),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let tok = self.expect_any()?;
        match tok.kind {
            TokenKind::Ident(name) => Ok(Ident {
                span: tok.span,
                node: name,
            }),
            _ => Err(ParseError {
                message: "expected identifier".to_string(),
                span: tok.span,
            }),
        }
    }

    fn expect_type_name(&mut self) -> Result<Ident, ParseError> {
        let id = self.expect_ident()?;
        if !is_type_name(&id.node) {
            return Err(ParseError {
                message: format!("type and variant names must be capitalized: '{}'", id.node),
                span: id.span,
            });
        }
        Ok(id)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let tok = self.expect_any()?;
        if mem::discriminant(&tok.kind) == mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError {
                message: format!("expected {expected:?}, found {:?}", tok.kind),
                span: tok.span,
            })
        }
    }

    fn expect_any(&mut self) -> Result<Token, ParseError> {
        self.next().ok_or_else(|| ParseError {
            message: "unexpected end of input".to_string(),
            span: span_between(0, 0),
        })
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| mem::discriminant(k) == mem::discriminant(&kind))
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.idx)?.clone();
        self.idx += 1;
        Some(tok)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.idx).map(|t| &t.kind)
    }

    fn peek_kind_n(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.idx + n).map(|t| &t.kind)
    }

    fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.idx).map(|t| t.span)
    }
}

fn cmp_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::Neq => Some(BinOp::Ne),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Ge => Some(BinOp::Ge),
        _ => None,
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr {
        span: join(left.span, right.span),
        kind: ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
    }
}

fn path_span(path: &[Ident], fallback: Span) -> Span {
    path.last().map(|id| id.span).unwrap_or(fallback)
}

fn join(a: Span, b: Span) -> Span {
    let a0: usize = a.offset();
    let b0: usize = b.offset();
    let a1 = a0 + a.len();
    let b1 = b0 + b.len();
    span_between(a0.min(b0), a1.max(b1))
}
