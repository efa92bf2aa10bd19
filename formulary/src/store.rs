//! Formula stores
//!
//! A store maps formula names to their source text. It is the only place
//! the resolver reads from outside the caller's arguments.

use formulary_core::FormulaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Lookup of formula text by name
pub trait FormulaStore: Send + Sync {
    /// Source text of `name`, or `FORMULA_NOT_FOUND`
    fn get_formula(&self, name: &str) -> Result<String, FormulaError>;
}

impl FormulaStore for HashMap<String, String> {
    fn get_formula(&self, name: &str) -> Result<String, FormulaError> {
        self.get(name).cloned().ok_or_else(|| FormulaError::formula_not_found(name))
    }
}

impl FormulaStore for BTreeMap<String, String> {
    fn get_formula(&self, name: &str) -> Result<String, FormulaError> {
        self.get(name).cloned().ok_or_else(|| FormulaError::formula_not_found(name))
    }
}

impl<S: FormulaStore + ?Sized> FormulaStore for &S {
    fn get_formula(&self, name: &str) -> Result<String, FormulaError> {
        (**self).get_formula(name)
    }
}

impl<S: FormulaStore + ?Sized> FormulaStore for Arc<S> {
    fn get_formula(&self, name: &str) -> Result<String, FormulaError> {
        (**self).get_formula(name)
    }
}

/// Owned in-memory store, serialized as a JSON object of name to text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapStore {
    formulas: BTreeMap<String, String>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a formula
    pub fn with_formula(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Add or replace a formula, returning the previous text
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) -> Option<String> {
        self.formulas.insert(name.into(), text.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.formulas.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.formulas.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Formula names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formulas.keys().map(String::as_str)
    }

    /// Parse `{"name": "text", ...}`
    pub fn from_json(json: &str) -> Result<Self, FormulaError> {
        serde_json::from_str(json)
            .map_err(|e| FormulaError::store(format!("invalid formula store JSON: {}", e)))
    }

    /// Read a JSON store file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormulaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FormulaError::store(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text).map_err(|e| e.with_note(format!("loading {}", path.display())))
    }
}

impl FormulaStore for MapStore {
    fn get_formula(&self, name: &str) -> Result<String, FormulaError> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| FormulaError::formula_not_found(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            formulas: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
