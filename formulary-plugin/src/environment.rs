//! Parameter Environment
//!
//! The named values a formula is evaluated against. Records are plain
//! `Value::Object`s reached through dotted paths; callables sit next to
//! them as `Param::Function`. The resolver only ever reads an environment.

use crate::{FnPlugin, FunctionPlugin};
use formulary_core::{FormulaError, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A single environment entry
#[derive(Clone)]
pub enum Param {
    Value(Value),
    Function(Arc<dyn FunctionPlugin>),
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Param::Function(func) => f.debug_tuple("Function").field(&func.meta().name).finish(),
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Value(v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    params: HashMap<String, Param>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a value (scalar or record)
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_value(name, value);
        self
    }

    /// Builder: add a function plugin under `name`
    pub fn with_function<F: FunctionPlugin + 'static>(mut self, name: impl Into<String>, f: F) -> Self {
        self.params.insert(name.into(), Param::Function(Arc::new(f)));
        self
    }

    /// Builder: add a closure as a callable
    pub fn with_fn<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FormulaError> + Send + Sync + 'static,
    {
        self.with_function(name, FnPlugin::new(func))
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), Param::Value(value.into()));
    }

    /// Build from a record: every field becomes a parameter
    pub fn from_record(record: Value) -> Result<Self, FormulaError> {
        match record {
            Value::Object(fields) => Ok(Self {
                params: fields.into_iter().map(|(k, v)| (k, Param::Value(v))).collect(),
            }),
            other => Err(FormulaError::type_error("Object", other.type_name())),
        }
    }

    /// Build from a JSON object; nested objects become records
    pub fn from_json(json: serde_json::Value) -> Result<Self, FormulaError> {
        Self::from_record(Value::from_json(json)?)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        match self.params.get(name) {
            Some(Param::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn FunctionPlugin> {
        match self.params.get(name) {
            Some(Param::Function(f)) => Some(f.as_ref()),
            _ => None,
        }
    }

    /// Resolve a dotted path: the first part names a parameter, the rest
    /// walk through record fields.
    pub fn lookup(&self, path: &[String]) -> Result<&Value, FormulaError> {
        let (root, rest) = match path.split_first() {
            Some(split) => split,
            None => return Err(FormulaError::undefined_var("")),
        };
        match self.params.get(root) {
            Some(Param::Value(v)) => v.get_path(rest.iter().map(String::as_str)),
            Some(Param::Function(_)) => Err(FormulaError::type_error("Value", "Function")
                .with_note(format!("'{}' is a function; call it as {}(...)", root, root))),
            None => Err(FormulaError::undefined_var(root)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::{codes, record};

    fn env() -> Environment {
        Environment::new()
            .with_value("Input", record! { One: 1, Inner: record! { Three: 3 } })
            .with_value("rate", 0.5)
            .with_fn("twice", |args| match args {
                [Value::Number(n)] => Ok(Value::Number(n.add(n))),
                _ => Err(FormulaError::custom("twice takes one number")),
            })
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_nested() {
        let env = env();
        let v = env.lookup(&path(&["Input", "Inner", "Three"])).unwrap();
        assert_eq!(v.as_number().unwrap().to_i64(), Some(3));
        assert_eq!(env.lookup(&path(&["rate"])).unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_lookup_missing_root() {
        let err = env().lookup(&path(&["Output", "Five"])).unwrap_err();
        assert_eq!(err.code, codes::UNDEFINED_VAR);
        assert!(err.message.contains("Output"));
    }

    #[test]
    fn test_lookup_missing_field() {
        let err = env().lookup(&path(&["Input", "Two"])).unwrap_err();
        assert_eq!(err.code, codes::UNDEFINED_FIELD);
    }

    #[test]
    fn test_function_is_not_a_value() {
        let env = env();
        assert!(env.get_function("twice").is_some());
        assert!(env.get_value("twice").is_none());
        assert!(env.lookup(&path(&["twice"])).is_err());
    }

    #[test]
    fn test_closure_error_message_kept() {
        let env = env();
        let f = env.get_function("twice").unwrap();
        let err = f.call(&[], &env).unwrap_err();
        assert_eq!(err.to_string(), "twice takes one number");
    }

    #[test]
    fn test_from_json() {
        let env = Environment::from_json(serde_json::json!({
            "Output": { "Five": 5, "Six": 6 }
        }))
        .unwrap();
        let v = env.lookup(&path(&["Output", "Six"])).unwrap();
        assert_eq!(v.as_number().unwrap().to_i64(), Some(6));
        assert!(Environment::from_json(serde_json::json!([1, 2])).is_err());
    }
}
