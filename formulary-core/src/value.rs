//! Runtime values
//!
//! Values can be numbers, text, booleans, records (objects reachable through
//! dotted paths), lists or null. Callables live next to values in the
//! parameter environment, not inside them.

use crate::{FormulaError, Number};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Number(Number),
    Text(String),
    Bool(bool),
    Object(HashMap<String, Value>),
    List(Vec<Value>),
    Null,
}

impl Value {
    // ========== Safe Accessors (never panic) ==========

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // ========== Object Field Access ==========

    /// Get field from object
    pub fn get(&self, key: &str) -> Result<&Value, FormulaError> {
        match self {
            Value::Object(map) => map.get(key).ok_or_else(|| FormulaError::undefined_field(key)),
            _ => Err(FormulaError::type_error("Object", self.type_name())
                .with_note(format!("reading field '{}'", key))),
        }
    }

    /// Follow a dotted path (`Inner.Three`) through nested objects
    pub fn get_path<'a, I>(&self, path: I) -> Result<&Value, FormulaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for part in path {
            current = current.get(part)?;
        }
        Ok(current)
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bool(_) => "Bool",
            Value::Object(_) => "Object",
            Value::List(_) => "List",
            Value::Null => "Null",
        }
    }

    // ========== Literal Rendering ==========

    /// Render as a literal of the formula language, used when a resolved
    /// formula is spliced into the text of the formula referencing it.
    ///
    /// Negative numbers are parenthesised so the surrounding operators
    /// cannot rebind them (`formula.x ^ 2` with x = -3 becomes `(-3) ^ 2`).
    pub fn to_literal(&self) -> Result<String, FormulaError> {
        match self {
            Value::Number(n) if n.is_negative() => Ok(format!("({})", n)),
            Value::Number(n) => Ok(n.to_string()),
            Value::Text(s) => Ok(quote(s)),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            Value::List(items) => {
                let rendered = items
                    .iter()
                    .map(Value::to_literal)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", rendered.join(", ")))
            }
            Value::Object(_) => Err(FormulaError::not_a_literal(self.type_name())),
        }
    }

    // ========== JSON ==========

    /// Convert plain JSON (as found in environment files) into a Value.
    /// JSON objects become records, numbers keep their decimal text.
    pub fn from_json(json: serde_json::Value) -> Result<Self, FormulaError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(Number::from_str(&n.to_string())?),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(
                items.into_iter().map(Value::from_json).collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Plain JSON rendering, the inverse of `from_json` for finite numbers
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => n
                .to_string()
                .parse::<serde_json::Number>()
                .map(serde_json::Value::Number)
                .unwrap_or_else(|_| serde_json::Value::String(n.to_string())),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Object(obj) => {
                // Sorted so the rendering is stable
                let sorted: BTreeMap<_, _> = obj.iter().collect();
                let fields: Vec<String> = sorted.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
            Value::List(items) => {
                let contents: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", contents.join(", "))
            }
            Value::Null => write!(f, "null"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// From implementations for convenience
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from_i64(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from_i64(n as i64))
    }
}

/// Non-finite floats have no literal form and become `Null`
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(fields: HashMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}
