use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex, MutexGuard};

use seahash::SeaHasher;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::datatype::{Bag, Callable, CallableId, Value};
use crate::error::{NamedCallError, Result};
use crate::metadata::SignatureMetadata;
use crate::validation;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

type Signatures = HashMap<CallableId, Arc<SignatureMetadata>, OtherHasher>;

pub(crate) fn callable_of(target: &Value) -> Result<&Arc<Callable>> {
    target.as_callable().ok_or_else(|| {
        NamedCallError::NotInvocable(format!("{} is a {}", target, target.type_name()))
    })
}

/// Owns the side table of signature metadata, keyed by callable identity, and
/// performs named invocations against it.
///
/// The table lock is only held for lookups and single assignments, never while a
/// callable body or a validation predicate runs, so both may call back into the
/// engine.
pub struct Engine {
    signatures: Mutex<Signatures>,
    pub(crate) config: EngineConfig,
    pub(crate) rule_checker: Value,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }
    pub fn with_config(config: EngineConfig) -> Self {
        let (rule_checker, metadata) = validation::rule_checker();
        let mut signatures = Signatures::default();
        if let Some(callable) = rule_checker.as_callable() {
            signatures.insert(callable.id(), Arc::new(metadata));
        }
        Self {
            signatures: Mutex::new(signatures),
            config,
            rule_checker,
        }
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn signatures(&self) -> Result<MutexGuard<'_, Signatures>> {
        self.signatures
            .lock()
            .map_err(|e| NamedCallError::Lock(e.to_string()))
    }

    pub(crate) fn snapshot(&self, id: CallableId) -> Result<Arc<SignatureMetadata>> {
        Ok(self.signatures()?.get(&id).cloned().unwrap_or_default())
    }

    /// Calls `target` with `scope` as receiver, taking its arguments by name from
    /// `named_args`, falling back on declared defaults.
    ///
    /// Parameters are visited in declared order. A declared type makes the
    /// parameter required and is checked first; the validation rule, if any, is
    /// only consulted once the type check has passed. The first failure ends the
    /// invocation and the callable is never reached.
    pub fn invoke_named(&self, target: &Value, scope: &Value, named_args: &Bag) -> Result<Value> {
        let callable = callable_of(target)?;
        let order = self.resolve(callable)?;
        let metadata = self.snapshot(callable.id())?;
        debug!(
            callable = callable.name(),
            parameters = order.len(),
            supplied = named_args.len(),
            "invoking with named arguments"
        );
        let mut positional = Vec::with_capacity(order.len());
        for parameter in &order {
            // caller-supplied values win over declared defaults
            let supplied = named_args
                .get(parameter)
                .or_else(|| metadata.defaults().get(parameter));
            let usable = self.config.falsy.usable(supplied);
            if let Some(data_type) = metadata.types().get(parameter) {
                let value = usable.ok_or_else(|| NamedCallError::MissingRequiredArgument {
                    parameter: parameter.clone(),
                })?;
                if !data_type.check(value) {
                    return Err(NamedCallError::TypeMismatch {
                        parameter: parameter.clone(),
                        expected: data_type.to_string(),
                        found: value.type_name(),
                    });
                }
            }
            // rules see the supplied value itself, falsy or not
            if let Some(rule) = metadata.validations().get(parameter) {
                rule.check(parameter, supplied.filter(|value| !value.is_null()))?;
            }
            let value = usable.cloned().unwrap_or_default();
            trace!(parameter = parameter.as_str(), value = %value, "resolved");
            positional.push(value);
        }
        callable.call(scope, &positional)
    }

    /// Wraps `target` for repeated named invocation.
    pub fn named(&self, target: &Value) -> Result<NamedFunction<'_>> {
        callable_of(target)?;
        Ok(NamedFunction {
            engine: self,
            target: target.clone(),
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// A callable bound to the engine holding its metadata.
pub struct NamedFunction<'e> {
    engine: &'e Engine,
    target: Value,
}

impl<'e> NamedFunction<'e> {
    pub fn apply_named(&self, scope: &Value, named_args: &Bag) -> Result<Value> {
        self.engine.invoke_named(&self.target, scope, named_args)
    }
    pub fn parameter_order(&self) -> Result<Vec<String>> {
        self.engine.resolve_parameter_order(&self.target)
    }
    pub fn add_validations(&self, validations: &Bag) -> Result<()> {
        self.engine.add_validations(&self.target, validations)
    }
    pub fn target(&self) -> &Value {
        &self.target
    }
}
