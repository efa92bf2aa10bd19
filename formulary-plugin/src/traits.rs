//! Plugin traits

use crate::Environment;
use formulary_core::{FormulaError, Value};
use serde::Serialize;

/// Metadata about a function argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, typ: &'static str, description: &'static str) -> Self {
        Self { name, typ, description, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, typ: &'static str, description: &'static str, default: &'static str) -> Self {
        Self { name, typ, description, optional: true, default: Some(default) }
    }
}

/// Metadata for a function plugin
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
    pub category: &'static str,
}

/// Pure function callable from a formula.
///
/// An `Err` aborts the whole evaluation and reaches the caller of
/// `resolve` unchanged.
pub trait FunctionPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &[Value], env: &Environment) -> Result<Value, FormulaError>;
}

/// Adapter turning a closure into a `FunctionPlugin`, used for callables
/// registered directly in an `Environment`.
pub struct FnPlugin<F> {
    func: F,
}

impl<F> FnPlugin<F>
where
    F: Fn(&[Value]) -> Result<Value, FormulaError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> FunctionPlugin for FnPlugin<F>
where
    F: Fn(&[Value]) -> Result<Value, FormulaError> + Send + Sync,
{
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "<closure>",
            description: "Caller-supplied function",
            usage: "f(...)",
            args: &[],
            returns: "Any",
            examples: &[],
            category: "environment",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        (self.func)(args)
    }
}
