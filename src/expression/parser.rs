//! Recursive-descent parser producing [`Expr`] trees

use super::lexer::{expr_err, tokenize, Span, Token, TokenKind};
use super::{named_constant, BinaryOp, Expr, Function, Symbol, UnaryOp};
use crate::errors::Result;

/// Parse expression text into an [`Expr`].
///
/// Syntax errors are reported as `ExpressionSyntax` with a 1-based line and
/// column.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(input, &tokens);
    let expr = parser.parse_or()?;
    if let Some(t) = parser.peek() {
        return Err(expr_err(
            input,
            t.span,
            format!("unexpected token after expression: {:?}", t.kind),
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn end_span(&self) -> Span {
        Span {
            start: self.input.len(),
            end: self.input.len(),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        match self.advance() {
            Some(t) if t.kind == expected => Ok(t),
            Some(t) => Err(expr_err(
                self.input,
                t.span,
                format!("expected {expected:?}, got {:?}", t.kind),
            )),
            None => Err(expr_err(
                self.input,
                self.end_span(),
                format!("expected {expected:?}, got end of input"),
            )),
        }
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek_kind(), Some(TokenKind::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Self::binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek_kind(), Some(TokenKind::And)) {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = Self::binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let lhs = self.parse_add()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Eq) => BinaryOp::Eq,
            Some(TokenKind::Ne) => BinaryOp::Ne,
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        Ok(Self::binary(op, lhs, rhs))
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Not) => Some(UnaryOp::Not),
            Some(TokenKind::Plus) => None,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(match op {
            Some(op) => Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            None => operand,
        })
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_postfix()?;
        if matches!(self.peek_kind(), Some(TokenKind::Pow)) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Self::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let expr = self.parse_atom()?;
        if !matches!(self.peek_kind(), Some(TokenKind::LBracket)) {
            return Ok(expr);
        }

        let open = self.expect(TokenKind::LBracket)?;
        let Expr::Symbol(Symbol { scope: None, name: scope }) = expr else {
            return Err(expr_err(
                self.input,
                open.span,
                "only plain names can be indexed, as child['variable']",
            ));
        };
        let name = match self.advance() {
            Some(Token {
                kind: TokenKind::Str(name),
                ..
            }) => name,
            Some(t) => {
                return Err(expr_err(
                    self.input,
                    t.span,
                    format!("expected a quoted variable name, got {:?}", t.kind),
                ))
            }
            None => {
                return Err(expr_err(
                    self.input,
                    self.end_span(),
                    "expected a quoted variable name, got end of input",
                ))
            }
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Symbol(Symbol::scoped(scope, name)))
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Num(n),
                ..
            }) => Ok(Expr::Constant(n)),
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                let expr = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) => {
                if !matches!(self.peek_kind(), Some(TokenKind::LParen)) {
                    if let Some(value) = named_constant(&name) {
                        return Ok(Expr::Constant(value));
                    }
                    return Ok(Expr::Symbol(Symbol::bare(name)));
                }

                let function = Function::from_name(&name).ok_or_else(|| {
                    expr_err(self.input, span, format!("unknown function: '{name}'"))
                })?;
                self.advance();
                let mut args = Vec::new();
                if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
                    args.push(self.parse_or()?);
                    while matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                        self.advance();
                        args.push(self.parse_or()?);
                    }
                }
                self.expect(TokenKind::RParen)?;
                if args.len() != function.arity() {
                    return Err(expr_err(
                        self.input,
                        span,
                        format!(
                            "function '{name}' takes {} argument(s), got {}",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }
                Ok(Expr::Call { function, args })
            }
            Some(Token { kind, span }) => Err(expr_err(
                self.input,
                span,
                format!("expected number, identifier, or '(', got {kind:?}"),
            )),
            None => Err(expr_err(
                self.input,
                self.end_span(),
                "unexpected end of input",
            )),
        }
    }
}
