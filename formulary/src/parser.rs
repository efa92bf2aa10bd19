//! Expression parser
//!
//! The grammar lives in `formula.pest`; operator precedence and
//! associativity are assigned here by a Pratt parser, lowest first.

use crate::ast::{BinOp, Expr, UnaryOp};
use formulary_core::{FormulaError, Number};
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::sync::OnceLock;

#[derive(Parser)]
#[grammar = "formula.pest"]
struct FormulaParser;

fn pratt() -> &'static PrattParser<Rule> {
    static PRATT: OnceLock<PrattParser<Rule>> = OnceLock::new();
    PRATT.get_or_init(|| {
        PrattParser::new()
            .op(Op::infix(Rule::or, Assoc::Left))
            .op(Op::infix(Rule::and, Assoc::Left))
            .op(Op::infix(Rule::eq, Assoc::Left)
                | Op::infix(Rule::ne, Assoc::Left)
                | Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::le, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::ge, Assoc::Left))
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::rem, Assoc::Left))
            .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not))
            .op(Op::infix(Rule::pow, Assoc::Right))
    })
}

/// Parse expression text into an AST
pub fn parse_expr(input: &str) -> Result<Expr, FormulaError> {
    if input.trim().is_empty() {
        return Err(FormulaError::parse_error("Empty expression"));
    }

    let mut pairs = FormulaParser::parse(Rule::program, input).map_err(|e| {
        let position = match e.location {
            InputLocation::Pos(p) => p,
            InputLocation::Span((p, _)) => p,
        };
        FormulaError::parse_error(format!("{} at position {}", e.variant.message(), position))
            .at_position(position)
    })?;

    // program = SOI ~ expr ~ EOI
    let expr = pairs
        .next()
        .and_then(|program| program.into_inner().next())
        .ok_or_else(|| FormulaError::internal("parser produced no expression"))?;
    build_expr(expr.into_inner())
}

fn build_expr(pairs: Pairs<Rule>) -> Result<Expr, FormulaError> {
    pratt()
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::neg => UnaryOp::Neg,
                Rule::not => UnaryOp::Not,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::UnaryOp(op, Box::new(rhs?)))
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinOp::Or,
                Rule::and => BinOp::And,
                Rule::eq => BinOp::Eq,
                Rule::ne => BinOp::Ne,
                Rule::lt => BinOp::Lt,
                Rule::le => BinOp::Le,
                Rule::gt => BinOp::Gt,
                Rule::ge => BinOp::Ge,
                Rule::add => BinOp::Add,
                Rule::sub => BinOp::Sub,
                Rule::mul => BinOp::Mul,
                Rule::div => BinOp::Div,
                Rule::rem => BinOp::Rem,
                Rule::pow => BinOp::Pow,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::BinaryOp(Box::new(lhs?), op, Box::new(rhs?)))
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr, FormulaError> {
    match pair.as_rule() {
        Rule::expr => build_expr(pair.into_inner()),
        Rule::number => Ok(Expr::Number(Number::from_str(pair.as_str())?)),
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::StringLiteral(unescape(raw)))
        }
        Rule::true_lit => Ok(Expr::Bool(true)),
        Rule::false_lit => Ok(Expr::Bool(false)),
        Rule::null_lit => Ok(Expr::Null),
        Rule::list => {
            let items = pair.into_inner()
                .map(|p| build_expr(p.into_inner()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::List(items))
        }
        Rule::path => {
            let parts = pair.into_inner().map(|p| p.as_str().to_string()).collect();
            Ok(Expr::Variable(parts))
        }
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .map(|p| p.as_str().to_string())
                .ok_or_else(|| FormulaError::internal("call without a name"))?;
            let mut args = Vec::new();
            let mut fields = Vec::new();
            for p in inner {
                match p.as_rule() {
                    Rule::expr => args.push(build_expr(p.into_inner())?),
                    Rule::field => fields.extend(p.into_inner().map(|f| f.as_str().to_string())),
                    rule => return Err(unexpected(rule)),
                }
            }
            let call = Expr::FunctionCall(name, args);
            if fields.is_empty() {
                Ok(call)
            } else {
                Ok(Expr::FieldAccess(Box::new(call), fields))
            }
        }
        rule => Err(unexpected(rule)),
    }
}

fn unexpected(rule: Rule) -> FormulaError {
    FormulaError::internal(format!("unexpected grammar rule {:?}", rule))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
