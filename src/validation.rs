//! Per-parameter validation rules and their registrar.
//!
//! Rules are registered from descriptor objects of the form
//! `{test: <function or pattern>, required: <boolean>}`, both keys optional.
//! The descriptors are themselves checked by a named invocation against an
//! internal callable whose parameters `test` and `required` carry validation
//! rules, so malformed descriptors are caught by the same machinery that later
//! enforces them.

use std::sync::Arc;

use tracing::debug;

use crate::datatype::{Bag, Callable, Pattern, Value};
use crate::engine::{Engine, callable_of};
use crate::error::{NamedCallError, Result};
use crate::metadata::SignatureMetadata;
use crate::named;

#[derive(Debug, Clone)]
pub enum Test {
    /// Called with the value as its only argument; a truthy result passes.
    Predicate(Arc<Callable>),
    /// Matched against the display form of the value.
    Pattern(Pattern),
}

impl Test {
    pub fn passes(&self, value: &Value) -> Result<bool> {
        match self {
            Test::Predicate(callable) => {
                Ok(callable.call(&Value::Null, std::slice::from_ref(value))?.is_truthy())
            }
            Test::Pattern(pattern) => Ok(pattern.is_match(&value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationRule {
    test: Option<Test>,
    required: bool,
}

impl ValidationRule {
    pub fn new(test: Option<Test>, required: bool) -> Self {
        Self { test, required }
    }
    pub fn test(&self) -> Option<&Test> {
        self.test.as_ref()
    }
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// `value` is whatever was supplied for `parameter`, `None` when it was
    /// absent or `Null`. Falsy values reach the test as they are.
    pub fn check(&self, parameter: &str, value: Option<&Value>) -> Result<()> {
        let Some(value) = value else {
            if self.required {
                return Err(NamedCallError::RequiredValidation {
                    parameter: parameter.to_string(),
                });
            }
            return Ok(());
        };
        if let Some(test) = &self.test {
            if !test.passes(value)? {
                return Err(NamedCallError::ValidationFailed {
                    parameter: parameter.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn from_descriptor(descriptor: &Bag) -> Result<ValidationRule> {
        let test = match descriptor.get("test") {
            None | Some(Value::Null) => None,
            Some(Value::Function(callable)) => Some(Test::Predicate(Arc::clone(callable))),
            Some(Value::Pattern(pattern)) => Some(Test::Pattern(pattern.clone())),
            Some(other) => {
                return Err(NamedCallError::InvalidSpecification(format!(
                    "test must be a function or a pattern, found {}",
                    other.type_name()
                )));
            }
        };
        let required = match descriptor.get("required") {
            None | Some(Value::Null) => false,
            Some(Value::Boolean(required)) => *required,
            Some(other) => {
                return Err(NamedCallError::InvalidSpecification(format!(
                    "required must be a boolean, found {}",
                    other.type_name()
                )));
            }
        };
        Ok(ValidationRule { test, required })
    }
}

/// Builds a rule descriptor for [`Engine::add_validations`].
pub fn rule(test: impl Into<Value>, required: bool) -> Value {
    let test: Value = test.into();
    Value::Object(named! { "test" => test, "required" => required })
}

fn predicate_rule<F>(name: &str, test: F) -> ValidationRule
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    ValidationRule::new(Some(Test::Predicate(Arc::new(Callable::predicate(name, test)))), false)
}

/// The callable every rule descriptor is run through before it is registered.
pub(crate) fn rule_checker() -> (Value, SignatureMetadata) {
    let checker = Value::from(Callable::new("validation rule", |_, _| Ok(Value::Boolean(true))));
    let mut metadata = SignatureMetadata::default();
    metadata.parameter_order = Some(vec!["test".to_string(), "required".to_string()]);
    metadata.validations.insert(
        "test".to_string(),
        predicate_rule("is test", |v| matches!(v, Value::Function(_) | Value::Pattern(_))),
    );
    metadata.validations.insert(
        "required".to_string(),
        predicate_rule("is boolean", |v| matches!(v, Value::Boolean(_))),
    );
    (checker, metadata)
}

impl Engine {
    /// Merges rules into the metadata of `target`. Rules for parameters that
    /// are not mentioned in `validations` stay as they were. Every descriptor is
    /// checked before anything is merged.
    pub fn add_validations(&self, target: &Value, validations: &Bag) -> Result<()> {
        let callable = callable_of(target)?;
        let mut rules = Vec::with_capacity(validations.len());
        for (name, descriptor) in validations {
            let fields = descriptor.as_bag().ok_or_else(|| {
                NamedCallError::InvalidSpecification(format!(
                    "validation for {} must be an object, found {}",
                    name,
                    descriptor.type_name()
                ))
            })?;
            self.invoke_named(&self.rule_checker, &Value::Null, fields)
                .map_err(|e| match e {
                    NamedCallError::ValidationFailed { parameter, value } => {
                        NamedCallError::InvalidSpecification(format!(
                            "validation for {}: {} cannot be {} '{}'",
                            name,
                            parameter,
                            value.type_name(),
                            value
                        ))
                    }
                    other => other,
                })?;
            rules.push((name.clone(), ValidationRule::from_descriptor(fields)?));
        }
        let mut signatures = self.signatures()?;
        let metadata = Arc::make_mut(signatures.entry(callable.id()).or_default());
        for (name, rule) in rules {
            debug!(callable = callable.name(), parameter = name.as_str(), "adding validation");
            metadata.validations.insert(name, rule);
        }
        Ok(())
    }
}
