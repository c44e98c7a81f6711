//! Tokenizer for expression text

use crate::errors::{PlotVarError, Result};
use logos::{Lexer, Logos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<logos::Span> for Span {
    fn from(span: logos::Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub(crate) enum TokenKind {
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", number)]
    Num(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Quoted member name, either quote style
    #[regex(r"'[^']*'", unquote)]
    #[regex(r#""[^"]*""#, unquote)]
    Str(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    #[token("^")]
    Pow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,
}

fn number(lex: &mut Lexer<'_, TokenKind>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn unquote(lex: &mut Lexer<'_, TokenKind>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

fn line_col_1based(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let mut line = 1;
    let mut col = 1;
    for &b in &input.as_bytes()[..offset] {
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

pub(crate) fn expr_err(input: &str, span: Span, message: impl Into<String>) -> PlotVarError {
    let (line, col) = line_col_1based(input, span.start);
    PlotVarError::ExpressionSyntax {
        line,
        col,
        message: message.into(),
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    if let Some((start, ch)) = input.char_indices().find(|(_, ch)| !ch.is_ascii()) {
        return Err(expr_err(
            input,
            Span {
                start,
                end: start + ch.len_utf8(),
            },
            "expression must be ASCII",
        ));
    }

    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with(['\'', '"']) {
                    "unterminated string literal".to_string()
                } else {
                    format!("unexpected character: '{slice}'")
                };
                return Err(expr_err(input, span, message));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            kinds("a**b * c <= !d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Pow,
                TokenKind::Ident("b".into()),
                TokenKind::Star,
                TokenKind::Ident("c".into()),
                TokenKind::Le,
                TokenKind::Not,
                TokenKind::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 3. 1e3 2.5E-2"),
            vec![
                TokenKind::Num(1.0),
                TokenKind::Num(2.5),
                TokenKind::Num(0.5),
                TokenKind::Num(3.0),
                TokenKind::Num(1000.0),
                TokenKind::Num(0.025),
            ]
        );
    }

    #[test]
    fn test_quoted_names_and_spans() {
        let tokens = tokenize("model[\"air temp\"]").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Str("air temp".into()));
        assert_eq!(tokens[2].span, Span { start: 6, end: 16 });
        assert_eq!(kinds("m['t']")[2], TokenKind::Str("t".into()));
    }

    #[test]
    fn test_errors_carry_position() {
        match tokenize("a +\n $b") {
            Err(PlotVarError::ExpressionSyntax { line, col, .. }) => {
                assert_eq!((line, col), (2, 2));
            }
            other => panic!("Expected ExpressionSyntax, got {other:?}"),
        }
        match tokenize("m['open") {
            Err(PlotVarError::ExpressionSyntax { col, message, .. }) => {
                assert_eq!(col, 3);
                assert!(message.contains("unterminated"));
            }
            other => panic!("Expected ExpressionSyntax, got {other:?}"),
        }
        assert!(tokenize("temp°").is_err());
    }
}
