//! Recursive formula resolution
//!
//! Formula text may reference other stored formulas with `formula.<name>`
//! tokens. Each reference is resolved depth first, left to right, its value
//! rendered as a literal and spliced into the referencing text, which is
//! then compiled and run like any other expression.
//!
//! Tokens are found the way a plain word scan would find them: parentheses
//! are ignored, the text is split on single spaces, and a word counts as a
//! reference when it starts with `formula.`. A token glued to other
//! punctuation (`max(formula.a,`) is therefore not a reference.

use crate::eval::Program;
use crate::store::FormulaStore;
use formulary_core::{FormulaError, Value};
use formulary_plugin::{Environment, PluginRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, trace};

const REFERENCE_PREFIX: &str = "formula.";

/// Default limit on nested references
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Resolver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Deepest chain of nested references accepted before `DEPTH_EXCEEDED`
    pub max_depth: usize,
    /// Fail with `CIRCULAR_REF` as soon as a formula references itself
    /// through the chain being resolved
    pub detect_cycles: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            detect_cycles: true,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }
}

/// A `formula.<name>` token found in formula text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referenced formula name, without the prefix
    pub name: String,
    /// Byte range of the token in the scanned text
    pub span: Range<usize>,
}

/// Find every reference token in `text`, in order of appearance.
///
/// Words are split on single spaces. Parentheses wrapping a word are not
/// part of its token; a word with a parenthesis inside the name
/// (`formula.a)(b`) is not a reference and is left for the parser.
pub fn scan_references(text: &str) -> Vec<Reference> {
    let mut refs = Vec::new();
    let mut offset = 0;
    for word in text.split(' ') {
        let start = offset;
        offset += word.len() + 1;

        let lead = word.len() - word.trim_start_matches('(').len();
        let token = word.trim_start_matches('(').trim_end_matches(')');
        if !token.starts_with(REFERENCE_PREFIX) {
            continue;
        }
        let name = &token[REFERENCE_PREFIX.len()..];
        if name.contains(['(', ')']) {
            continue;
        }
        refs.push(Reference {
            name: name.to_string(),
            span: start + lead..start + lead + token.len(),
        });
    }
    refs
}

/// State shared by every level of one top-level resolution
struct Walk<'a> {
    env: &'a Environment,
    store: &'a dyn FormulaStore,
    /// Names currently being resolved, outermost first
    stack: Vec<String>,
}

/// Resolves formula references, then evaluates the substituted text
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<PluginRegistry>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_standard_library() -> Self {
        Self::new(formulary_std::standard_registry())
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Resolve every reference in `text`, then compile and run the result
    pub fn resolve(&self, text: &str, env: &Environment, store: &dyn FormulaStore) -> Result<Value, FormulaError> {
        let mut walk = Walk { env, store, stack: Vec::new() };
        self.resolve_in(text, &mut walk)
    }

    /// Substitute every reference in `text` without evaluating the result.
    /// Referenced formulas are still evaluated to obtain their values.
    pub fn expand(&self, text: &str, env: &Environment, store: &dyn FormulaStore) -> Result<String, FormulaError> {
        let mut walk = Walk { env, store, stack: Vec::new() };
        self.expand_in(text, &mut walk)
    }

    /// Names referenced directly by `text`, in order, repeats included
    pub fn references(text: &str) -> Vec<String> {
        scan_references(text).into_iter().map(|r| r.name).collect()
    }

    fn resolve_in(&self, text: &str, walk: &mut Walk<'_>) -> Result<Value, FormulaError> {
        let expanded = self.expand_in(text, walk)?;
        let program = Program::compile(&expanded, walk.env, &self.registry)?;
        program.run(walk.env, &self.registry)
    }

    fn expand_in(&self, text: &str, walk: &mut Walk<'_>) -> Result<String, FormulaError> {
        let refs = scan_references(text);
        if refs.is_empty() {
            return Ok(text.to_string());
        }

        // one value per name within this text
        let mut literals: HashMap<&str, String> = HashMap::new();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for r in &refs {
            if !literals.contains_key(r.name.as_str()) {
                let value = self.resolve_reference(&r.name, walk)?;
                let literal = value.to_literal()
                    .map_err(|e| e.with_note(format!("value of {}{}", REFERENCE_PREFIX, r.name)))?;
                literals.insert(r.name.as_str(), literal);
            }
            out.push_str(&text[last..r.span.start]);
            out.push_str(&literals[r.name.as_str()]);
            last = r.span.end;
        }
        out.push_str(&text[last..]);

        trace!(depth = walk.stack.len(), from = text, to = %out, "substituted references");
        Ok(out)
    }

    fn resolve_reference(&self, name: &str, walk: &mut Walk<'_>) -> Result<Value, FormulaError> {
        if self.config.detect_cycles {
            if let Some(pos) = walk.stack.iter().position(|n| n == name) {
                let mut chain = walk.stack[pos..].to_vec();
                chain.push(name.to_string());
                return Err(FormulaError::circular_ref(&chain));
            }
        }
        if walk.stack.len() >= self.config.max_depth {
            return Err(FormulaError::depth_exceeded(self.config.max_depth)
                .with_note(format!("while resolving {}{}", REFERENCE_PREFIX, name)));
        }

        debug!(name, depth = walk.stack.len() + 1, "resolving formula reference");
        let text = walk.store.get_formula(name)?;

        walk.stack.push(name.to_string());
        let result = self.resolve_in(&text, walk);
        walk.stack.pop();
        result
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::with_standard_library()
    }
}
