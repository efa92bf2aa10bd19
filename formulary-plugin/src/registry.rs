//! Plugin Registry

use crate::{Environment, FunctionMeta, FunctionPlugin};
use formulary_core::{FormulaError, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Library of named functions shared by every evaluation.
///
/// Names are case-insensitive. Callables registered in an `Environment`
/// shadow registry functions of the same name.
#[derive(Clone)]
pub struct PluginRegistry {
    functions: HashMap<String, Arc<dyn FunctionPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn with_function<F: FunctionPlugin + 'static>(mut self, f: F) -> Self {
        let name = f.meta().name.to_lowercase();
        self.functions.insert(name, Arc::new(f));
        self
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn FunctionPlugin> {
        self.functions.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn call_function(&self, name: &str, args: &[Value], env: &Environment) -> Result<Value, FormulaError> {
        match self.get_function(name) {
            Some(f) => f.call(args, env),
            None => Err(self.unknown_function(name)),
        }
    }

    /// `UNDEFINED_FUNC` error with the closest registry names as suggestion
    pub fn unknown_function(&self, name: &str) -> FormulaError {
        let similar = self.find_similar_functions(name);
        let err = FormulaError::undefined_func(name);
        if similar.is_empty() {
            return err;
        }
        let suggestions: Vec<&str> = similar.iter().take(5).map(|s| s.as_str()).collect();
        err.with_suggestion(format!("Similar: {}", suggestions.join(", ")))
    }

    fn find_similar_functions(&self, name: &str) -> Vec<String> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self.functions.keys()
            .filter_map(|func_name| {
                let score = Self::similarity_score(&name_lower, func_name);
                if score > 0 {
                    Some((func_name.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        // Higher score first, then alphabetical for stable output
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        let common = query_chars.intersection(&candidate_chars).count();
        // Sharing a single letter is noise
        if common >= 2 {
            score += common * 2;
        }

        let len_diff = query.len().abs_diff(candidate.len());
        if len_diff < 5 && score > 0 {
            score += 5 - len_diff;
        }

        score
    }

    /// Help for one function, or an overview grouped by category
    pub fn help(&self, name: Option<&str>) -> Result<Value, FormulaError> {
        match name {
            Some(n) => match self.get_function(n) {
                Some(f) => Ok(Value::Object(Self::function_to_help(f.meta()))),
                None => Err(self.unknown_function(n)),
            },
            None => Ok(self.general_help()),
        }
    }

    fn general_help(&self) -> Value {
        let mut funcs_by_cat: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, f) in &self.functions {
            funcs_by_cat.entry(f.meta().category.to_string()).or_default().push(name.clone());
        }
        let mut help = HashMap::new();
        help.insert("functions".to_string(),
            Value::Object(funcs_by_cat.into_iter()
                .map(|(k, mut v)| {
                    v.sort();
                    (k, Value::List(v.into_iter().map(Value::Text).collect()))
                })
                .collect()));
        help.insert("usage".to_string(),
            Value::Text("Call help('function_name') for detailed help.".to_string()));
        Value::Object(help)
    }

    fn function_to_help(meta: FunctionMeta) -> HashMap<String, Value> {
        let mut help = HashMap::new();
        help.insert("name".to_string(), Value::Text(meta.name.to_string()));
        help.insert("description".to_string(), Value::Text(meta.description.to_string()));
        help.insert("usage".to_string(), Value::Text(meta.usage.to_string()));
        help.insert("returns".to_string(), Value::Text(meta.returns.to_string()));
        help.insert("category".to_string(), Value::Text(meta.category.to_string()));
        help.insert("args".to_string(), Value::List(
            meta.args.iter().map(|a| {
                let mut arg = HashMap::new();
                arg.insert("name".to_string(), Value::Text(a.name.to_string()));
                arg.insert("type".to_string(), Value::Text(a.typ.to_string()));
                arg.insert("description".to_string(), Value::Text(a.description.to_string()));
                arg.insert("optional".to_string(), Value::Bool(a.optional));
                Value::Object(arg)
            }).collect()
        ));
        help.insert("examples".to_string(), Value::List(
            meta.examples.iter().map(|e| Value::Text(e.to_string())).collect()
        ));
        help
    }

    /// Sorted function names, optionally filtered by category
    pub fn list_functions(&self, category: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter()
            .filter(|(_, f)| category.map_or(true, |c| f.meta().category == c))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("functions", &self.list_functions(None))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgMeta;
    use formulary_core::codes;

    struct Double;

    static DOUBLE_ARGS: [ArgMeta; 1] = [ArgMeta::required("x", "Number", "Value to double")];

    impl FunctionPlugin for Double {
        fn meta(&self) -> FunctionMeta {
            FunctionMeta {
                name: "Double",
                description: "Multiply by two",
                usage: "double(x)",
                args: &DOUBLE_ARGS,
                returns: "Number",
                examples: &["double(21)"],
                category: "test",
            }
        }

        fn call(&self, args: &[Value], _env: &Environment) -> Result<Value, FormulaError> {
            match args {
                [Value::Number(n)] => Ok(Value::Number(n.add(n))),
                _ => Err(FormulaError::arg_count("double", 1, args.len())),
            }
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = PluginRegistry::new().with_function(Double);
        assert!(registry.contains("double"));
        assert!(registry.contains("DOUBLE"));
        let out = registry.call_function("double", &[Value::from(21)], &Environment::new()).unwrap();
        assert_eq!(out.as_number().unwrap().to_i64(), Some(42));
    }

    #[test]
    fn test_unknown_function_suggests_similar() {
        let registry = PluginRegistry::new().with_function(Double);
        let err = registry.call_function("doubel", &[], &Environment::new()).unwrap_err();
        assert_eq!(err.code, codes::UNDEFINED_FUNC);
        assert!(err.suggestion.unwrap().contains("double"));
    }

    #[test]
    fn test_help_for_function() {
        let registry = PluginRegistry::new().with_function(Double);
        let help = registry.help(Some("double")).unwrap();
        assert_eq!(help.get("usage").unwrap().as_text(), Some("double(x)"));
        assert!(registry.help(Some("nope")).is_err());
    }

    #[test]
    fn test_list_functions_by_category() {
        let registry = PluginRegistry::new().with_function(Double);
        assert_eq!(registry.list_functions(Some("test")), vec!["double".to_string()]);
        assert!(registry.list_functions(Some("math")).is_empty());
    }
}
