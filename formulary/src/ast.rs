//! Abstract Syntax Tree

use formulary_core::Number;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(Number),
    StringLiteral(String),
    Bool(bool),
    Null,
    /// Dotted path: `Input.Inner.Three`
    Variable(Vec<String>),
    /// List literal: [a, b, c]
    List(Vec<Expr>),
    BinaryOp(Box<Expr>, BinOp, Box<Expr>),
    UnaryOp(UnaryOp, Box<Expr>),
    FunctionCall(String, Vec<Expr>),
    /// Field read on a computed value: `f(x).a.b`
    FieldAccess(Box<Expr>, Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Or, And,
    Eq, Ne, Lt, Le, Gt, Ge,
    Add, Sub, Mul, Div, Rem, Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp { Neg, Not }

impl Expr {
    /// Visit every variable path and function name in the tree, left to
    /// right. Returns the deepest operand nesting evaluation recurses
    /// into; left operands of binary operators do not add to it.
    pub(crate) fn walk<'a>(&'a self, on_var: &mut dyn FnMut(&'a [String]), on_call: &mut dyn FnMut(&'a str)) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Expr::Number(_) | Expr::StringLiteral(_) | Expr::Bool(_) | Expr::Null => {}
                Expr::Variable(parts) => on_var(parts),
                Expr::List(items) => stack.extend(items.iter().rev().map(|item| (item, depth + 1))),
                Expr::BinaryOp(left, _, right) => {
                    stack.push((right.as_ref(), depth + 1));
                    stack.push((left.as_ref(), depth));
                }
                Expr::UnaryOp(_, inner) => stack.push((inner.as_ref(), depth + 1)),
                Expr::FunctionCall(name, args) => {
                    on_call(name);
                    stack.extend(args.iter().rev().map(|arg| (arg, depth + 1)));
                }
                Expr::FieldAccess(base, _) => stack.push((base.as_ref(), depth + 1)),
            }
        }
        deepest
    }

    /// Move the direct children out, leaving `Null` behind
    fn take_children(&mut self, out: &mut Vec<Expr>) {
        match self {
            Expr::BinaryOp(left, _, right) => {
                out.push(std::mem::replace(left.as_mut(), Expr::Null));
                out.push(std::mem::replace(right.as_mut(), Expr::Null));
            }
            Expr::UnaryOp(_, inner) | Expr::FieldAccess(inner, _) => {
                out.push(std::mem::replace(inner.as_mut(), Expr::Null));
            }
            Expr::List(items) | Expr::FunctionCall(_, items) => out.append(items),
            Expr::Number(_) | Expr::StringLiteral(_) | Expr::Bool(_) | Expr::Null | Expr::Variable(_) => {}
        }
    }
}

// Long operator chains nest thousands of boxes deep; tear them down
// with a heap stack instead of recursive drop glue.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}
