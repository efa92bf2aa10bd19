//! Core math functions

use formulary_plugin::prelude::*;

pub struct Abs;
pub struct Floor;
pub struct Ceil;
pub struct Round;
pub struct Sqrt;
pub struct Pow;

static X_ARGS: [ArgMeta; 1] = [ArgMeta::required("x", "Number", "Value")];

static ROUND_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("x", "Number", "Value to round"),
    ArgMeta::optional("places", "Number", "Decimal places to keep", "0"),
];
static POW_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("base", "Number", "Base value"),
    ArgMeta::required("exponent", "Number", "Exponent (non-integer needs a positive base)"),
];

/// Extract the single numeric argument of a one-argument function
fn single_number<'a>(func: &str, args: &'a [Value]) -> Result<&'a Number, FormulaError> {
    match args {
        [Value::Number(n)] => Ok(n),
        [other] => Err(FormulaError::arg_type(func, "x", "Number", other.type_name())),
        _ => Err(FormulaError::arg_count(func, 1, args.len())),
    }
}

impl FunctionPlugin for Abs {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "abs",
            description: "Absolute value",
            usage: "abs(x)",
            args: &X_ARGS,
            returns: "Number",
            examples: &["abs(-5)", "abs(3.14)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        Ok(Value::Number(single_number("abs", args)?.abs()))
    }
}

impl FunctionPlugin for Floor {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "floor",
            description: "Largest integer less than or equal to x",
            usage: "floor(x)",
            args: &X_ARGS,
            returns: "Number",
            examples: &["floor(3.7)", "floor(-2.3)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        Ok(Value::Number(single_number("floor", args)?.floor()))
    }
}

impl FunctionPlugin for Ceil {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "ceil",
            description: "Smallest integer greater than or equal to x",
            usage: "ceil(x)",
            args: &X_ARGS,
            returns: "Number",
            examples: &["ceil(3.2)", "ceil(-2.7)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        Ok(Value::Number(single_number("ceil", args)?.ceil()))
    }
}

impl FunctionPlugin for Round {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "round",
            description: "Round half away from zero, optionally to a number of decimal places",
            usage: "round(x, places?)",
            args: &ROUND_ARGS,
            returns: "Number",
            examples: &["round(3.5)", "round(2.345, 2)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        let (x, places) = match args {
            [x] => (x, 0),
            [x, Value::Number(p)] => {
                let places = p.to_i64()
                    .filter(|p| (0..=i64::from(u32::MAX)).contains(p))
                    .ok_or_else(|| FormulaError::domain_error("round() places must be a non-negative integer"))?;
                (x, places as u32)
            }
            [_, other] => return Err(FormulaError::arg_type("round", "places", "Number", other.type_name())),
            _ => return Err(FormulaError::arg_count("round", 2, args.len())),
        };
        match x {
            Value::Number(n) => Ok(Value::Number(n.round_to(places))),
            other => Err(FormulaError::arg_type("round", "x", "Number", other.type_name())),
        }
    }
}

impl FunctionPlugin for Sqrt {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "sqrt",
            description: "Square root",
            usage: "sqrt(x)",
            args: &X_ARGS,
            returns: "Number",
            examples: &["sqrt(16)", "sqrt(2)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        Ok(Value::Number(single_number("sqrt", args)?.sqrt()?))
    }
}

impl FunctionPlugin for Pow {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "pow",
            description: "Raise base to exponent",
            usage: "pow(base, exponent)",
            args: &POW_ARGS,
            returns: "Number",
            examples: &["pow(2, 10)", "pow(4, 0.5)"],
            category: "math",
        }
    }

    fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
        match args {
            [Value::Number(base), Value::Number(exp)] => Ok(Value::Number(base.pow_real(exp)?)),
            [Value::Number(_), other] => Err(FormulaError::arg_type("pow", "exponent", "Number", other.type_name())),
            [other, _] => Err(FormulaError::arg_type("pow", "base", "Number", other.type_name())),
            _ => Err(FormulaError::arg_count("pow", 2, args.len())),
        }
    }
}
