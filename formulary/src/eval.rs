//! Expression evaluator
//!
//! A `Program` is formula text that parsed and whose names were all found
//! in the environment or the registry. Running it walks the AST strictly:
//! the first error aborts evaluation and is returned unchanged.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::parser;
use formulary_core::{FormulaError, Number, Value};
use formulary_plugin::{Environment, PluginRegistry};
use std::cmp::Ordering;
use tracing::trace;

/// Deepest operand nesting a program may have. Left operand chains
/// (`1 + 2 + 3 + ...`) are evaluated in a loop and do not count.
pub const MAX_NESTING: usize = 256;

/// Compiled formula text
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    expr: Expr,
}

impl Program {
    /// Parse `source` and check that every variable path and function name
    /// it uses is known.
    pub fn compile(source: &str, env: &Environment, registry: &PluginRegistry) -> Result<Self, FormulaError> {
        let expr = parser::parse_expr(source).map_err(|e| e.with_formula(source))?;

        let mut vars = Vec::new();
        let mut calls = Vec::new();
        let nesting = expr.walk(&mut |path| vars.push(path), &mut |name| calls.push(name));
        if nesting > MAX_NESTING {
            return Err(FormulaError::parse_error(format!(
                "expression nests deeper than {} levels", MAX_NESTING
            ))
            .with_formula(source));
        }

        for path in vars {
            env.lookup(path).map_err(|e| e.with_formula(source))?;
        }
        for name in calls {
            if env.get_function(name).is_none() && !registry.contains(name) {
                return Err(registry.unknown_function(name).with_formula(source));
            }
        }

        trace!(formula = source, "compiled");
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against `env`; functions not found in `env` come from `registry`
    pub fn run(&self, env: &Environment, registry: &PluginRegistry) -> Result<Value, FormulaError> {
        Evaluator::new(env, registry)
            .eval_expr(&self.expr)
            .map_err(|e| e.with_formula(&self.source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// Tree-walking evaluator bound to one environment and registry
pub struct Evaluator<'a> {
    env: &'a Environment,
    registry: &'a PluginRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment, registry: &'a PluginRegistry) -> Self {
        Self { env, registry }
    }

    pub fn eval_expr(&self, expr: &Expr) -> Result<Value, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(n.clone())),
            Expr::StringLiteral(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),

            Expr::Variable(parts) => self.env.lookup(parts).cloned(),

            Expr::List(items) => {
                let values = items.iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }

            Expr::BinaryOp(..) => self.eval_chain(expr),

            Expr::UnaryOp(op, inner) => {
                let v = self.eval_expr(inner)?;
                self.eval_unary_op(*op, v)
            }

            Expr::FunctionCall(name, args) => {
                let evaluated_args = args.iter()
                    .map(|a| self.eval_expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, &evaluated_args)
            }

            Expr::FieldAccess(base, fields) => {
                let value = self.eval_expr(base)?;
                value.get_path(fields.iter().map(String::as_str)).cloned()
            }
        }
    }

    /// Environment callables shadow registry functions
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, FormulaError> {
        match self.env.get_function(name) {
            Some(f) => f.call(args, self.env),
            None => self.registry.call_function(name, args, self.env),
        }
    }

    /// Binary operators nest to the left (`1 + 2 + 3` is `(1 + 2) + 3`).
    /// The left spine is followed in a loop so long chains run in
    /// constant stack; only right operands recurse.
    fn eval_chain(&self, expr: &Expr) -> Result<Value, FormulaError> {
        let mut spine = Vec::new();
        let mut leftmost = expr;
        while let Expr::BinaryOp(left, op, right) = leftmost {
            spine.push((*op, right.as_ref()));
            leftmost = left.as_ref();
        }

        let mut acc = self.eval_expr(leftmost)?;
        for (op, right) in spine.into_iter().rev() {
            acc = match op {
                // the right operand is only evaluated when it can change the result
                BinOp::And | BinOp::Or => match (op, bool_operand(acc, op)?) {
                    (BinOp::And, false) => Value::Bool(false),
                    (BinOp::Or, true) => Value::Bool(true),
                    _ => Value::Bool(bool_operand(self.eval_expr(right)?, op)?),
                },
                _ => {
                    let r = self.eval_expr(right)?;
                    self.eval_binary_op(acc, op, r)?
                }
            };
        }
        Ok(acc)
    }

    fn eval_binary_op(&self, left: Value, op: BinOp, right: Value) -> Result<Value, FormulaError> {
        match op {
            BinOp::Eq => return Ok(Value::Bool(left == right)),
            BinOp::Ne => return Ok(Value::Bool(left != right)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ord = compare(&left, &right)?;
                let result = match op {
                    BinOp::Lt => ord == Ordering::Less,
                    BinOp::Le => ord != Ordering::Greater,
                    BinOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                };
                return Ok(Value::Bool(result));
            }
            _ => {}
        }

        if let (BinOp::Add, Value::Text(l), Value::Text(r)) = (op, &left, &right) {
            return Ok(Value::Text(format!("{}{}", l, r)));
        }

        let l = number_operand(&left, "left")?;
        let r = number_operand(&right, "right")?;

        let n = match op {
            BinOp::Add => l.add(r),
            BinOp::Sub => l.sub(r),
            BinOp::Mul => l.mul(r),
            BinOp::Div => l.checked_div(r)?,
            BinOp::Rem => l.checked_rem(r)?,
            BinOp::Pow => l.pow_real(r)?,
            BinOp::And | BinOp::Or | BinOp::Eq | BinOp::Ne
            | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                return Err(FormulaError::internal(format!("{:?} reached arithmetic", op)));
            }
        };
        Ok(Value::Number(n))
    }

    fn eval_unary_op(&self, op: UnaryOp, value: Value) -> Result<Value, FormulaError> {
        match (op, value) {
            (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(n.neg())),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Neg, other) => Err(FormulaError::type_error("Number", other.type_name())),
            (UnaryOp::Not, other) => Err(FormulaError::type_error("Bool", other.type_name())),
        }
    }
}

fn bool_operand(value: Value, op: BinOp) -> Result<bool, FormulaError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(FormulaError::type_error("Bool", other.type_name())
            .with_note(format!("operand of {:?}", op))),
    }
}

fn number_operand<'v>(value: &'v Value, side: &str) -> Result<&'v Number, FormulaError> {
    value.as_number().ok_or_else(|| {
        FormulaError::type_error("Number", value.type_name())
            .with_note(format!("from {} operand", side))
    })
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, FormulaError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(l.cmp(r)),
        (Value::Text(l), Value::Text(r)) => Ok(l.cmp(r)),
        (Value::Number(_), other) | (Value::Text(_), other) => {
            Err(FormulaError::type_error(left.type_name(), other.type_name()))
        }
        (other, _) => Err(FormulaError::type_error("Number or Text", other.type_name())),
    }
}
