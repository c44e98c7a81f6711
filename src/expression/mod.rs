//! Symbolic expressions over variables and dimensions
//!
//! Expressions are parsed once into an [`Expr`] tree and then evaluated either
//! point by point ([`Expr::eval_scalar`]) or over whole arrays with
//! broadcasting ([`Expr::eval_array`]). Both evaluators share the same scalar
//! kernels, so they agree element for element.
//!
//! # Grammar
//!
//! ```text
//! expr    := or
//! or      := and ('||' and)*
//! and     := cmp ('&&' cmp)*
//! cmp     := add (('==' | '!=' | '<' | '<=' | '>' | '>=') add)?
//! add     := mul (('+' | '-') mul)*
//! mul     := unary (('*' | '/') unary)*
//! unary   := ('-' | '+' | '!') unary | power
//! power   := postfix (('**' | '^') unary)?
//! postfix := IDENT '[' STRING ']' | atom
//! atom    := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```
//!
//! Comparisons and logical operators produce 1.0 or 0.0; any non-zero value
//! counts as true. The identifier `pi` is the constant π.

pub mod eval;
mod lexer;
mod parser;

pub use eval::Value;
pub use parser::parse;

use std::fmt;

/// Reference to a named variable, optionally inside a child store
/// (`child['name']`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub scope: Option<String>,
    pub name: String,
}

impl Symbol {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            scope: None,
            name: name.into(),
        }
    }

    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}['{}']", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Neg => -value,
            Self::Not => truth(value == 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
            Self::Eq => truth(lhs == rhs),
            Self::Ne => truth(lhs != rhs),
            Self::Lt => truth(lhs < rhs),
            Self::Le => truth(lhs <= rhs),
            Self::Gt => truth(lhs > rhs),
            Self::Ge => truth(lhs >= rhs),
            Self::And => truth(lhs != 0.0 && rhs != 0.0),
            Self::Or => truth(lhs != 0.0 || rhs != 0.0),
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div => 5,
            Self::Pow => 7,
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Sinh,
    Cosh,
    Tanh,
    Floor,
    Ceil,
    Pow,
    Min,
    Max,
    Arctan2,
    Where,
}

impl Function {
    const ALL: [Function; 21] = [
        Self::Abs,
        Self::Sqrt,
        Self::Exp,
        Self::Log,
        Self::Log10,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Arcsin,
        Self::Arccos,
        Self::Arctan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Floor,
        Self::Ceil,
        Self::Pow,
        Self::Min,
        Self::Max,
        Self::Arctan2,
        Self::Where,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Arcsin => "arcsin",
            Self::Arccos => "arccos",
            Self::Arctan => "arctan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Pow => "pow",
            Self::Min => "min",
            Self::Max => "max",
            Self::Arctan2 => "arctan2",
            Self::Where => "where",
        }
    }

    pub const fn arity(self) -> usize {
        match self {
            Self::Pow | Self::Min | Self::Max | Self::Arctan2 => 2,
            Self::Where => 3,
            _ => 1,
        }
    }

    /// Apply to exactly [`Function::arity`] arguments.
    pub fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Self::Abs, [x]) => x.abs(),
            (Self::Sqrt, [x]) => x.sqrt(),
            (Self::Exp, [x]) => x.exp(),
            (Self::Log, [x]) => x.ln(),
            (Self::Log10, [x]) => x.log10(),
            (Self::Sin, [x]) => x.sin(),
            (Self::Cos, [x]) => x.cos(),
            (Self::Tan, [x]) => x.tan(),
            (Self::Arcsin, [x]) => x.asin(),
            (Self::Arccos, [x]) => x.acos(),
            (Self::Arctan, [x]) => x.atan(),
            (Self::Sinh, [x]) => x.sinh(),
            (Self::Cosh, [x]) => x.cosh(),
            (Self::Tanh, [x]) => x.tanh(),
            (Self::Floor, [x]) => x.floor(),
            (Self::Ceil, [x]) => x.ceil(),
            (Self::Pow, [x, y]) => x.powf(*y),
            (Self::Min, [x, y]) => x.min(*y),
            (Self::Max, [x, y]) => x.max(*y),
            (Self::Arctan2, [y, x]) => y.atan2(*x),
            (Self::Where, [c, a, b]) => {
                if *c != 0.0 {
                    *a
                } else {
                    *b
                }
            }
            _ => f64::NAN,
        }
    }
}

/// Value of a reserved constant identifier such as `pi`.
///
/// Such names always parse as constants, so variables cannot be referenced
/// by them.
#[must_use]
pub fn named_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        _ => None,
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Symbol(Symbol),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parse expression text.
    pub fn parse(text: &str) -> crate::errors::Result<Self> {
        parse(text)
    }

    /// Referenced symbols, each once, in order of first appearance.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        fn walk(expr: &Expr, out: &mut Vec<Symbol>) {
            match expr {
                Expr::Constant(_) => {}
                Expr::Symbol(symbol) => {
                    if !out.contains(symbol) {
                        out.push(symbol.clone());
                    }
                }
                Expr::Unary { operand, .. } => walk(operand, out),
                Expr::Binary { lhs, rhs, .. } => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
                Expr::Call { args, .. } => args.iter().for_each(|a| walk(a, out)),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// The symbol, when the whole expression is a single reference.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => 6,
            _ => 8,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => {
                if *value == std::f64::consts::PI {
                    f.write_str("pi")
                } else {
                    write!(f, "{value}")
                }
            }
            Expr::Symbol(symbol) => write!(f, "{symbol}"),
            Expr::Unary { op, operand } => {
                f.write_str(match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                })?;
                write_operand(f, operand, operand.precedence() < 6)
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                // Comparisons do not chain; powers associate to the right.
                let (left_parens, right_parens) = match op {
                    BinaryOp::Pow => (lhs.precedence() <= prec, rhs.precedence() < 6),
                    _ if prec == 3 => (lhs.precedence() <= prec, rhs.precedence() <= prec),
                    _ => (lhs.precedence() < prec, rhs.precedence() <= prec),
                };
                write_operand(f, lhs, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, rhs, right_parens)
            }
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

const fn truth(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}
