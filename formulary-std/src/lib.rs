//! Formulary Standard Library

pub mod functions;

use formulary_plugin::PluginRegistry;

/// Load standard library into registry
pub fn load_standard_library(registry: PluginRegistry) -> PluginRegistry {
    registry
        .with_function(functions::Abs)
        .with_function(functions::Floor)
        .with_function(functions::Ceil)
        .with_function(functions::Round)
        .with_function(functions::Sqrt)
        .with_function(functions::Pow)
        .with_function(functions::Min)
        .with_function(functions::Max)
        .with_function(functions::Len)
}

/// Create registry with standard library
pub fn standard_registry() -> PluginRegistry {
    load_standard_library(PluginRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = standard_registry();
        for name in ["abs", "floor", "ceil", "round", "sqrt", "pow", "min", "max", "len"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert_eq!(registry.list_functions(Some("math")).len(), 8);
    }
}
