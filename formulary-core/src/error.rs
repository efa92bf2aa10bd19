//! Structured errors
//!
//! Every failure in Formulary (store lookups, compilation, evaluation,
//! custom functions) is a `FormulaError`. Errors are relayed unchanged up
//! through nested formula resolution, so `Display` prints the message only;
//! `describe()` gives the long form with code and suggestion.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const UNDEFINED_VAR: &str = "UNDEFINED_VAR";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const UNDEFINED_FIELD: &str = "UNDEFINED_FIELD";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const OVERFLOW: &str = "OVERFLOW";
    pub const FORMULA_NOT_FOUND: &str = "FORMULA_NOT_FOUND";
    pub const CIRCULAR_REF: &str = "CIRCULAR_REF";
    pub const DEPTH_EXCEEDED: &str = "DEPTH_EXCEEDED";
    pub const NOT_A_LITERAL: &str = "NOT_A_LITERAL";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const CUSTOM: &str = "CUSTOM";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The formula could not be evaluated
    Error,
    /// The resolution chain itself is broken (cycles, runaway depth)
    Fatal,
}

/// Context about where an error occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Formula text that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Byte offset in the formula text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    /// Propagation notes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Where the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    pub severity: Severity,
}

impl FormulaError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            context: None,
            severity: Severity::Error,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set formula context, keeping the innermost one if already set
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        if ctx.formula.is_none() {
            ctx.formula = Some(formula.into());
        }
        self
    }

    pub fn at_position(mut self, position: usize) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.position = Some(position);
        self
    }

    /// Builder: add propagation note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// Long form: `[CODE] message (suggestion: ...)`
    pub fn describe(&self) -> String {
        let mut out = format!("[{}] {}", self.code, self.message);
        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!(" (suggestion: {})", suggestion));
        }
        out
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Check formula syntax")
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
            .with_suggestion("Ensure divisor is not zero")
    }

    pub fn undefined_var(name: &str) -> Self {
        Self::new(codes::UNDEFINED_VAR, format!("Undefined variable: {}", name))
            .with_suggestion(format!("Define '{}' in the environment or check spelling", name))
    }

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
    }

    pub fn undefined_field(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FIELD, format!("Undefined field: {}", name))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(codes::TYPE_ERROR, format!("Expected {}, got {}", expected, got))
    }

    pub fn arg_count(func: &str, expected: usize, got: usize) -> Self {
        Self::new(codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", func, expected, got))
    }

    pub fn arg_type(func: &str, arg: &str, expected: &str, got: &str) -> Self {
        Self::new(codes::ARG_TYPE,
            format!("{}() argument '{}': expected {}, got {}", func, arg, expected, got))
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn formula_not_found(name: &str) -> Self {
        Self::new(codes::FORMULA_NOT_FOUND, format!("formula '{}' does not exist", name))
    }

    pub fn circular_ref(chain: &[String]) -> Self {
        Self::new(codes::CIRCULAR_REF,
            format!("Circular reference: {}", chain.join(" → ")))
            .with_suggestion("Remove circular dependency")
            .with_severity(Severity::Fatal)
    }

    pub fn depth_exceeded(limit: usize) -> Self {
        Self::new(codes::DEPTH_EXCEEDED,
            format!("Formula references nested deeper than {} levels", limit))
            .with_severity(Severity::Fatal)
    }

    pub fn not_a_literal(type_name: &str) -> Self {
        Self::new(codes::NOT_A_LITERAL,
            format!("{} result cannot be substituted into a formula", type_name))
            .with_suggestion("Referenced formulas must evaluate to a number, text, bool, list or null")
    }

    pub fn store(details: impl Into<String>) -> Self {
        Self::new(codes::STORE_ERROR, details)
    }

    /// Error raised by a caller-supplied function; the message is kept verbatim
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(codes::CUSTOM, message)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_severity(Severity::Fatal)
    }
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FormulaError {}

impl From<NumberError> for FormulaError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => Self::parse_error(format!("invalid number '{}'", s)),
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::DomainError(s) => Self::domain_error(s),
            NumberError::Overflow => Self::new(codes::OVERFLOW, "Numeric overflow"),
        }
    }
}
