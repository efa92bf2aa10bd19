//! Formulary - recursive formula resolution
//!
//! Formulas are expressions that may reference other stored formulas as
//! `formula.<name>`. Resolution inlines each referenced formula's value and
//! evaluates the result against the caller's parameters.
//!
//! ```no_run
//! use formulary::{Formulary, MapStore, Environment, record};
//!
//! let env = Environment::new()
//!     .with_value("Output", record! { Five: 5, Six: 6 })
//!     .with_value("Input", record! { One: 1 });
//! let store = MapStore::new().with_formula("inner", "Output.Five - Input.One");
//! let value = Formulary::default().resolve("Output.Six / formula.inner", &env, &store);
//! ```

mod ast;
mod parser;
mod eval;
mod store;
mod resolve;

pub use ast::{BinOp, Expr, UnaryOp};
pub use eval::{Evaluator, Program};
pub use parser::parse_expr;
pub use resolve::{scan_references, Reference, Resolver, ResolverConfig, DEFAULT_MAX_DEPTH};
pub use store::{FormulaStore, MapStore};

pub use formulary_core::{codes, record, FormulaError, Number, Severity, Value};
pub use formulary_plugin::{Environment, FunctionPlugin, Param, PluginRegistry};

/// Main Formulary engine
#[derive(Debug, Clone, Default)]
pub struct Formulary {
    resolver: Resolver,
}

impl Formulary {
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            resolver: Resolver::new(registry),
        }
    }

    pub fn with_standard_library() -> Self {
        Self::new(formulary_std::standard_registry())
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.resolver = self.resolver.with_config(config);
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve references in `text` and evaluate it
    pub fn resolve(&self, text: &str, env: &Environment, store: &dyn FormulaStore) -> Result<Value, FormulaError> {
        self.resolver.resolve(text, env, store)
    }

    /// Resolve the stored formula `name`
    pub fn resolve_named(&self, name: &str, env: &Environment, store: &dyn FormulaStore) -> Result<Value, FormulaError> {
        let text = store.get_formula(name)?;
        self.resolver.resolve(&text, env, store)
    }

    /// Text of `text` with every reference replaced by its value
    pub fn expand(&self, text: &str, env: &Environment, store: &dyn FormulaStore) -> Result<String, FormulaError> {
        self.resolver.expand(text, env, store)
    }

    /// Compile reference-free text
    pub fn compile(&self, text: &str, env: &Environment) -> Result<Program, FormulaError> {
        Program::compile(text, env, self.resolver.registry())
    }

    /// Compile and run reference-free text
    pub fn evaluate(&self, text: &str, env: &Environment) -> Result<Value, FormulaError> {
        self.compile(text, env)?.run(env, self.resolver.registry())
    }

    pub fn help(&self, name: Option<&str>) -> Result<Value, FormulaError> {
        self.resolver.registry().help(name)
    }

    pub fn list_functions(&self, category: Option<&str>) -> Vec<String> {
        self.resolver.registry().list_functions(category)
    }
}

/// Resolve `text` with the standard library and default settings
pub fn resolve(text: &str, env: &Environment, store: &dyn FormulaStore) -> Result<Value, FormulaError> {
    Resolver::with_standard_library().resolve(text, env, store)
}
