//! Constant-expression grammar for immediate operands and directive
//! arguments. Parsed once into a tree, evaluated against the symbol map at
//! encoding time with 64-bit signed arithmetic.

use nom::{
    branch::alt,
    bytes::complete::{is_a, tag, tag_no_case},
    character::complete::{alpha1, alphanumeric1, char, digit1, hex_digit1, oct_digit1, one_of, space0},
    combinator::{all_consuming, map, map_res, recognize},
    multi::{fold_many0, many0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::diag::ErrorKind;
use crate::symbols::SymbolMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Symbol(String),
    Negate(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluated {
    pub value: i64,
    /// True when any symbol reference contributed to the value. Drives the
    /// PC subtraction for relative immediates.
    pub saw_symbol: bool,
}

fn number(i: &str) -> IResult<&str, i64> {
    alt((
        map_res(preceded(tag_no_case("0x"), hex_digit1), |d: &str| {
            i64::from_str_radix(d, 16)
        }),
        map_res(preceded(tag_no_case("0b"), is_a("01")), |d: &str| {
            i64::from_str_radix(d, 2)
        }),
        map_res(preceded(tag("0"), oct_digit1), |d: &str| {
            i64::from_str_radix(d, 8)
        }),
        map_res(digit1, |d: &str| d.parse::<i64>()),
    ))(i)
}

fn symbol(i: &str) -> IResult<&str, Expr> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| Expr::Symbol(s.to_owned()),
    )(i)
}

fn paren(i: &str) -> IResult<&str, Expr> {
    delimited(char('('), expr, preceded(space0, char(')')))(i)
}

// A sign binds to a literal or a parenthesized expression, never a bare
// symbol: '-abcd' is not a negative symbol reference.
fn signed(i: &str) -> IResult<&str, Expr> {
    let (i, sign) = one_of("+-")(i)?;
    let (i, inner) = preceded(space0, alt((map(number, Expr::Number), paren)))(i)?;
    Ok((
        i,
        if sign == '-' {
            Expr::Negate(Box::new(inner))
        } else {
            inner
        },
    ))
}

fn factor(i: &str) -> IResult<&str, Expr> {
    preceded(
        space0,
        alt((map(number, Expr::Number), paren, signed, symbol)),
    )(i)
}

fn binary(op: char, lhs: Expr, rhs: Expr) -> Expr {
    let op = match op {
        '+' => BinOp::Add,
        '-' => BinOp::Sub,
        '*' => BinOp::Mul,
        _ => BinOp::Div,
    };
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn term(i: &str) -> IResult<&str, Expr> {
    let (i, first) = factor(i)?;
    fold_many0(
        pair(preceded(space0, one_of("*/")), factor),
        move || first.clone(),
        |lhs, (op, rhs)| binary(op, lhs, rhs),
    )(i)
}

fn expr(i: &str) -> IResult<&str, Expr> {
    let (i, first) = term(i)?;
    fold_many0(
        pair(preceded(space0, one_of("+-")), term),
        move || first.clone(),
        |lhs, (op, rhs)| binary(op, lhs, rhs),
    )(i)
}

pub fn parse(input: &str) -> Result<Expr, ErrorKind> {
    match all_consuming(terminated(expr, space0))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(_) => Err(ErrorKind::MalformedExpression(input.to_owned())),
    }
}

pub fn eval(expr: &Expr, symbols: &SymbolMap) -> Result<Evaluated, ErrorKind> {
    Ok(match expr {
        Expr::Number(n) => Evaluated {
            value: *n,
            saw_symbol: false,
        },
        Expr::Symbol(name) => {
            let address = symbols
                .get(name)
                .ok_or_else(|| ErrorKind::UndefinedSymbol(name.clone()))?;
            Evaluated {
                value: i64::from(*address),
                saw_symbol: true,
            }
        }
        Expr::Negate(inner) => {
            let inner = eval(inner, symbols)?;
            Evaluated {
                value: inner.value.wrapping_neg(),
                ..inner
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, symbols)?;
            let rhs = eval(rhs, symbols)?;
            let value = match op {
                BinOp::Add => lhs.value.wrapping_add(rhs.value),
                BinOp::Sub => lhs.value.wrapping_sub(rhs.value),
                BinOp::Mul => lhs.value.wrapping_mul(rhs.value),
                BinOp::Div => {
                    if rhs.value == 0 {
                        return Err(ErrorKind::DivisionByZero);
                    }
                    lhs.value.wrapping_div(rhs.value)
                }
            };
            Evaluated {
                value,
                saw_symbol: lhs.saw_symbol || rhs.saw_symbol,
            }
        }
    })
}

pub fn parse_and_eval(input: &str, symbols: &SymbolMap) -> Result<Evaluated, ErrorKind> {
    eval(&parse(input)?, symbols)
}

/// Constant-fold an operand with no symbols in scope. `None` when the
/// operand is not a constant expression.
pub fn constant(input: &str) -> Option<i64> {
    parse_and_eval(input, &SymbolMap::new())
        .ok()
        .map(|e| e.value)
}
