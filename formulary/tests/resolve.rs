//! End-to-end resolution scenarios

use formulary::{codes, record, Environment, FormulaError, Formulary, MapStore, Number, Resolver, Value};
use std::collections::HashMap;

fn params() -> Environment {
    Environment::new()
        .with_value("Input", record! { One: 1, Two: 2, Inner: record! { Three: 3 } })
        .with_value("Output", record! { Five: 5, Six: 6 })
}

fn resolve(text: &str, store: &MapStore) -> Result<Value, FormulaError> {
    Formulary::default().resolve(text, &params(), store)
}

#[test]
fn test_inner_formula_in_parenthesised_sum() {
    let store = MapStore::new().with_formula("inner_formula", "Output.Five - Input.One");
    let text = "(Output.Six - Input.Two) * Input.Inner.Three / (formula.inner_formula + Input.Two)";
    let v = resolve(text, &store).unwrap();
    assert_eq!(v.as_number().unwrap().to_i64(), Some(2));
}

#[test]
fn test_inner_formula_as_divisor() {
    let store = MapStore::new().with_formula("inner_formula", "Output.Six - Input.One");
    let text = "(Output.Six - Input.Two) * Input.Inner.Three / formula.inner_formula";
    let v = resolve(text, &store).unwrap();
    assert_eq!(v.to_string(), "2.4");
    assert_eq!(v, Value::Number(Number::from_str("2.4").unwrap()));
}

#[test]
fn test_missing_formula_is_named() {
    let text = "(Output.Six - Input.Two) * Input.Inner.Three / formula.inner_formula";
    let err = resolve(text, &MapStore::new()).unwrap_err();
    assert_eq!(err.code, codes::FORMULA_NOT_FOUND);
    assert_eq!(err.to_string(), "formula 'inner_formula' does not exist");
}

#[test]
fn test_missing_formula_deep_in_chain() {
    let store = MapStore::new()
        .with_formula("a", "formula.b + 1")
        .with_formula("b", "formula.c * 2");
    let err = resolve("formula.a", &store).unwrap_err();
    assert_eq!(err.to_string(), "formula 'c' does not exist");
}

#[test]
fn test_undefined_parameters_fail_to_compile() {
    let err = resolve("name + age", &MapStore::new()).unwrap_err();
    assert_eq!(err.code, codes::UNDEFINED_VAR);

    let store = MapStore::new().with_formula("inner_formula", "name + age");
    let err = resolve("Input.One + formula.inner_formula", &store).unwrap_err();
    assert_eq!(err.code, codes::UNDEFINED_VAR);
    let context = err.context.unwrap();
    assert_eq!(context.formula.as_deref(), Some("name + age"));
}

#[test]
fn test_custom_function_error_is_relayed() {
    let env = params().with_fn("error", |_| Err(FormulaError::custom("custom error")));
    let formulary = Formulary::default();

    let err = formulary.resolve("error()", &env, &MapStore::new()).unwrap_err();
    assert_eq!(err.to_string(), "custom error");

    let store = MapStore::new().with_formula("broken", "error()");
    let err = formulary.resolve("formula.broken + 1", &env, &store).unwrap_err();
    assert_eq!(err.to_string(), "custom error");
    assert_eq!(err.code, codes::CUSTOM);
}

#[test]
fn test_caller_registered_round() {
    // floors to two decimals
    let env = params().with_fn("round", |args| match args {
        [Value::Number(n)] => {
            let hundred = Number::from_i64(100);
            Ok(Value::Number(n.mul(&hundred).floor().checked_div(&hundred)?))
        }
        _ => Err(FormulaError::custom("round takes one number")),
    });
    let v = Formulary::default()
        .resolve("round((Output.Six - Input.Two) * Input.Inner.Three / 3.4)", &env, &MapStore::new())
        .unwrap();
    assert_eq!(v.to_string(), "3.52");
}

#[test]
fn test_three_level_chain_matches_manual_inlining() {
    let store = MapStore::new()
        .with_formula("top", "formula.middle * Input.Two")
        .with_formula("middle", "formula.bottom + Output.Five")
        .with_formula("bottom", "Input.Inner.Three - Output.Six");
    let chained = resolve("formula.top / 4", &store).unwrap();
    let inlined = resolve("((3 - 6) + 5) * 2 / 4", &MapStore::new()).unwrap();
    assert_eq!(chained, inlined);
    assert_eq!(chained.to_string(), "1");
}

#[test]
fn test_same_token_gets_same_value() {
    let store = MapStore::new().with_formula("x", "Output.Six / 4");
    let text = Formulary::default().expand("formula.x + formula.x * 2", &params(), &store).unwrap();
    assert_eq!(text, "1.5 + 1.5 * 2");
    assert_eq!(resolve("formula.x + formula.x * 2", &store).unwrap().to_string(), "4.5");
}

#[test]
fn test_negative_value_keeps_its_sign_under_power() {
    let store = MapStore::new().with_formula("drop", "Input.One - Output.Six");
    assert_eq!(resolve("formula.drop ^ 2", &store).unwrap().to_string(), "25");
    assert_eq!(resolve("10 - formula.drop", &store).unwrap().to_string(), "15");
}

#[test]
fn test_name_prefixing_another_name() {
    let store = MapStore::new()
        .with_formula("rate", "2")
        .with_formula("rate_total", "30");
    assert_eq!(resolve("formula.rate_total + formula.rate", &store).unwrap().to_string(), "32");
}

#[test]
fn test_text_and_boolean_results_splice() {
    let store = MapStore::new()
        .with_formula("greeting", "'hello ' + \"world\"")
        .with_formula("big", "Output.Six > Output.Five");
    assert_eq!(resolve("formula.greeting", &store).unwrap(), Value::Text("hello world".to_string()));
    assert_eq!(resolve("formula.big and true", &store).unwrap(), Value::Bool(true));
}

#[test]
fn test_self_reference_is_circular() {
    let store = MapStore::new().with_formula("loop", "formula.loop + 1");
    let err = resolve("formula.loop", &store).unwrap_err();
    assert_eq!(err.code, codes::CIRCULAR_REF);
}

#[test]
fn test_std_maps_work_as_stores() {
    let mut store = HashMap::new();
    store.insert("inner_formula".to_string(), "Output.Six - Input.One".to_string());
    let v = Resolver::with_standard_library()
        .resolve("Output.Five / formula.inner_formula", &params(), &store)
        .unwrap();
    assert_eq!(v.to_string(), "1");
}

#[test]
fn test_parallel_resolutions_share_one_resolver() {
    let resolver = Resolver::with_standard_library();
    let store = MapStore::new().with_formula("inner_formula", "Output.Six - Input.One");
    let env = params();
    std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|i| {
                let (resolver, store, env) = (&resolver, &store, &env);
                s.spawn(move || {
                    let text = format!("formula.inner_formula * {}", i);
                    resolver.resolve(&text, env, store).map(|v| v.to_string())
                })
            })
            .collect();
        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert_eq!(results, vec!["5", "10", "15", "20"]);
    });
}

#[test]
fn test_huge_magnitudes_splice_in_exponent_form() {
    let store = MapStore::new()
        .with_formula("big", "1e1000000")
        .with_formula("tiny", "0 - 1e-500");
    assert_eq!(resolve("formula.big > 0", &store).unwrap(), Value::Bool(true));
    assert_eq!(resolve("formula.tiny < 0", &store).unwrap(), Value::Bool(true));

    let text = Formulary::default().expand("formula.big > 0", &params(), &store).unwrap();
    assert_eq!(text, "1e1000000 > 0");
}

#[test]
fn test_long_sum_through_a_reference() {
    let sum = vec!["Input.One"; 5000].join(" + ");
    let store = MapStore::new().with_formula("sum", &sum);
    let v = resolve("formula.sum - 1", &store).unwrap();
    assert_eq!(v.to_string(), "4999");
}
