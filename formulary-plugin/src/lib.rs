//! Formulary Plugin System
//!
//! Provides the pieces the expression engine evaluates against:
//! - `FunctionPlugin`: pure functions callable from formulas
//! - `PluginRegistry`: named library of functions shared across evaluations
//! - `Environment`: the caller's parameters (values, records and callables)

mod traits;
mod registry;
mod environment;

pub use traits::{FunctionPlugin, FunctionMeta, ArgMeta, FnPlugin};
pub use registry::PluginRegistry;
pub use environment::{Environment, Param};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        FunctionPlugin, FunctionMeta, ArgMeta,
        PluginRegistry, Environment, Param,
    };
    pub use formulary_core::prelude::*;
}
