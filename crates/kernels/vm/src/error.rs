//! Error types for compilation and configuration.

use thiserror::Error;

/// Failure to lower an expression tree into a program.
///
/// Every variant is a property of the input tree or of the configured limits.
/// Evaluation never produces these; run-time anomalies are error values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A parameter symbol addresses a slot beyond the declared count.
    #[error("parameter {id} out of range: program declares {num_params} parameters")]
    ParamOutOfRange {
        /// The offending symbol id.
        id: i32,
        /// Declared parameter count.
        num_params: usize,
    },

    /// A let reference has no enclosing binding at that depth.
    #[error("let reference {id} is unbound: only {active} bindings in scope")]
    UnboundLet {
        /// The offending (negative) symbol id.
        id: i32,
        /// Number of bindings active at the reference.
        active: usize,
    },

    /// A call-style function received the wrong number of arguments.
    #[error("{function} expects {expected} arguments, got {found}")]
    ArityMismatch {
        /// Function name.
        function: &'static str,
        /// Arity of the bound operation.
        expected: usize,
        /// Number of arguments in the tree.
        found: usize,
    },

    /// The tree nests deeper than the configured limit.
    #[error("expression nesting exceeds the limit of {limit} at a {kind} node")]
    NestingTooDeep {
        /// Configured `max_nesting_depth`.
        limit: usize,
        /// Kind of the first node beyond the limit.
        kind: &'static str,
    },

    /// The program would exceed the configured instruction count.
    #[error("program exceeds the limit of {limit} instructions")]
    ProgramTooLarge {
        /// Configured `max_program_size`.
        limit: usize,
    },

    /// The finished program failed static verification.
    #[error("invalid program at instruction {index}: {message}")]
    InvalidProgram {
        /// Index of the offending instruction.
        index: usize,
        /// Description of the violation.
        message: String,
    },
}

/// Failure to load a [`VmConfig`](crate::VmConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration YAML.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A limit is out of its valid range.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Result alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;
