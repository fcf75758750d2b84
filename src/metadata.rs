//! Signature metadata and the builder that produces it from parameter descriptors.
//!
//! Descriptors are checked when the metadata is built, not when the callable is
//! later invoked: names must be non-empty strings, types must be kind names or
//! classes, and a default given together with a type must satisfy that type.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::FalsyPolicy;
use crate::datatype::{Bag, TypeSpec, Value};
use crate::engine::{Engine, OtherHasher, callable_of};
use crate::error::{NamedCallError, Result};
use crate::validation::ValidationRule;

#[derive(Debug, Clone, Default)]
pub struct SignatureMetadata {
    /// `None` until an order is declared or inferred. A declared empty order
    /// is kept as `Some` and never replaced by inference.
    pub(crate) parameter_order: Option<Vec<String>>,
    pub(crate) types: HashMap<String, TypeSpec, OtherHasher>,
    pub(crate) defaults: Bag,
    pub(crate) validations: HashMap<String, ValidationRule, OtherHasher>,
}

impl SignatureMetadata {
    pub fn parameter_order(&self) -> &[String] {
        self.parameter_order.as_deref().unwrap_or_default()
    }
    pub fn types(&self) -> &HashMap<String, TypeSpec, OtherHasher> {
        &self.types
    }
    pub fn defaults(&self) -> &Bag {
        &self.defaults
    }
    pub fn validations(&self) -> &HashMap<String, ValidationRule, OtherHasher> {
        &self.validations
    }

    pub fn build(specs: &[ParameterSpec], falsy: FalsyPolicy) -> Result<SignatureMetadata> {
        let mut metadata = SignatureMetadata::default();
        let mut order = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = match &spec.name {
                Value::String(name) if !name.is_empty() => name.clone(),
                other => {
                    return Err(NamedCallError::InvalidSpecification(format!(
                        "parameter name must be a non-empty string, found '{}'",
                        other
                    )));
                }
            };
            if order.contains(&name) {
                return Err(NamedCallError::InvalidSpecification(format!(
                    "parameter '{}' is declared more than once",
                    name
                )));
            }
            if let Some(declared) = &spec.data_type {
                let data_type = TypeSpec::from_value(declared)?;
                if let Some(default) = &spec.default {
                    if !falsy.usable(Some(default)).is_some_and(|v| data_type.check(v)) {
                        return Err(NamedCallError::InvalidDefault {
                            parameter: name,
                            expected: data_type.to_string(),
                            found: default.type_name(),
                        });
                    }
                }
                metadata.types.insert(name.clone(), data_type);
            }
            if let Some(default) = &spec.default {
                metadata.defaults.insert(name.clone(), default.clone());
            }
            order.push(name);
        }
        metadata.parameter_order = Some(order);
        Ok(metadata)
    }
}

/// One parameter descriptor: a name, optionally a type and a default.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: Value,
    data_type: Option<Value>,
    default: Option<Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            default: None,
        }
    }
    /// A kind name such as `"string"`, or a class.
    pub fn typed(mut self, data_type: impl Into<Value>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl Engine {
    pub fn build_metadata(&self, specs: &[ParameterSpec]) -> Result<SignatureMetadata> {
        SignatureMetadata::build(specs, self.config.falsy)
    }

    /// Attaches `metadata` to `target`, replacing whatever was there.
    pub fn describe(&self, target: &Value, metadata: SignatureMetadata) -> Result<()> {
        let callable = callable_of(target)?;
        debug!(
            callable = callable.name(),
            parameters = metadata.parameter_order().len(),
            "attaching signature metadata"
        );
        self.signatures()?.insert(callable.id(), Arc::new(metadata));
        Ok(())
    }

    pub fn describe_with(&self, target: &Value, specs: &[ParameterSpec]) -> Result<()> {
        let metadata = self.build_metadata(specs)?;
        self.describe(target, metadata)
    }

    pub fn metadata(&self, target: &Value) -> Result<Arc<SignatureMetadata>> {
        self.snapshot(callable_of(target)?.id())
    }
}
