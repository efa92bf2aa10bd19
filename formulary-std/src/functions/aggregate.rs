//! Aggregate functions

use formulary_plugin::prelude::*;
use std::cmp::Ordering;

pub struct Min;
pub struct Max;
pub struct Len;

static VALUES_ARGS: [ArgMeta; 1] = [ArgMeta::required("values", "Number... | List", "Values to compare")];
static LEN_ARGS: [ArgMeta; 1] = [ArgMeta::required("value", "Text | List", "Text or list to measure")];

/// Numbers from either variadic arguments or a single list argument
fn numbers<'a>(func: &str, args: &'a [Value]) -> Result<Vec<&'a Number>, FormulaError> {
    let items = match args {
        [Value::List(items)] => items.as_slice(),
        _ => args,
    };
    if items.is_empty() {
        return Err(FormulaError::arg_count(func, 1, 0));
    }
    items.iter()
        .map(|v| match v {
            Value::Number(n) => Ok(n),
            other => Err(FormulaError::arg_type(func, "values", "Number", other.type_name())),
        })
        .collect()
}

fn extreme(func: &str, args: &[Value], keep: Ordering) -> Result<Value, FormulaError> {
    let nums = numbers(func, args)?;
    let mut best = nums[0];
    for &n in &nums[1..] {
        if n.cmp(best) == keep {
            best = n;
        }
    }
    Ok(Value::Number(best.clone()))
}

impl FunctionPlugin for Min {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "min",
            description: "Smallest of the values",
            usage: "min(a, b, ...)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &["min(3, 1, 2)", "min([4, 5])"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        extreme("min", args, Ordering::Less)
    }
}

impl FunctionPlugin for Max {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "max",
            description: "Largest of the values",
            usage: "max(a, b, ...)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &["max(3, 1, 2)", "max([4, 5])"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        extreme("max", args, Ordering::Greater)
    }
}

impl FunctionPlugin for Len {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "len",
            description: "Number of characters in a text or items in a list",
            usage: "len(value)",
            args: &LEN_ARGS,
            returns: "Number",
            examples: &["len(\"abc\")", "len([1, 2])"],
            category: "collection",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        let count = match args {
            [Value::Text(s)] => s.chars().count(),
            [Value::List(items)] => items.len(),
            [other] => return Err(FormulaError::arg_type("len", "value", "Text | List", other.type_name())),
            _ => return Err(FormulaError::arg_count("len", 1, args.len())),
        };
        Ok(Value::Number(Number::from_i64(count as i64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: &dyn FunctionPlugin, args: Vec<Value>) -> Result<Value, FormulaError> {
        f.call(&args, &Environment::new())
    }

    #[test]
    fn test_min_max_variadic() {
        let args = vec![Value::from(3), Value::from(1), Value::from(2)];
        assert_eq!(call(&Min, args.clone()).unwrap().to_string(), "1");
        assert_eq!(call(&Max, args).unwrap().to_string(), "3");
    }

    #[test]
    fn test_min_over_list() {
        let list = Value::List(vec![Value::from(4), Value::from(-5)]);
        assert_eq!(call(&Min, vec![list]).unwrap().to_string(), "-5");
    }

    #[test]
    fn test_min_rejects_text_and_empty() {
        assert_eq!(call(&Min, vec![Value::from("a")]).unwrap_err().code, codes::ARG_TYPE);
        assert_eq!(call(&Max, vec![]).unwrap_err().code, codes::ARG_COUNT);
    }

    #[test]
    fn test_len() {
        assert_eq!(call(&Len, vec![Value::from("héllo")]).unwrap().to_string(), "5");
        let list = Value::List(vec![Value::Null, Value::Null]);
        assert_eq!(call(&Len, vec![list]).unwrap().to_string(), "2");
    }
}
