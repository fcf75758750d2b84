
use thiserror::Error;

use crate::datatype::Value;

#[derive(Error, Debug)]
pub enum NamedCallError {
    #[error("Not invocable: {0}")]
    NotInvocable(String),
    #[error("Missing required argument: {parameter}")]
    MissingRequiredArgument { parameter: String },
    #[error("Type mismatch for {parameter}: expected {expected}, found {found}")]
    TypeMismatch { parameter: String, expected: String, found: String },
    #[error("Required validation failed: {parameter} has no value")]
    RequiredValidation { parameter: String },
    #[error("Validation failed for {parameter}: {value}")]
    ValidationFailed { parameter: String, value: Value },
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),
    #[error("Invalid default for {parameter}: expected {expected}, found {found}")]
    InvalidDefault { parameter: String, expected: String, found: String },
    #[error("Undeclared signature: {0}")]
    UndeclaredSignature(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("{0}")]
    Raised(String),
}

pub type Result<T> = std::result::Result<T, NamedCallError>;

// Helper conversions
impl From<::config::ConfigError> for NamedCallError {
    fn from(e: ::config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<regex::Error> for NamedCallError {
    fn from(e: regex::Error) -> Self { Self::InvalidSpecification(e.to_string()) }
}
