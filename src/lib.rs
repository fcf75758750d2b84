//! Namedcall – call functions with arguments given by name.
//!
//! A callable has a fixed, ordered parameter list. Namedcall lets a caller supply
//! the arguments as a name to value mapping instead, and takes care of the rest:
//! * The parameter order is resolved, either from an explicit declaration or by
//!   reading the callable's source text.
//! * Declared defaults fill in whatever the caller left out.
//! * Declared types are enforced, and a declared type makes a parameter required.
//! * Declared validation rules (predicates or patterns, optionally required) run
//!   once the type check has passed.
//! * The callable is finally invoked positionally, in declared order, with the
//!   given scope as its receiver.
//!
//! ## Modules
//! * [`datatype`] – The dynamic [`datatype::Value`] passed around as arguments,
//!   defaults and results, plus [`datatype::Callable`], classes and type specifications.
//! * [`signature`] – Parameter order resolution and source text inference.
//! * [`engine`] – The [`engine::Engine`] owning all signature metadata and performing
//!   named invocations.
//! * [`metadata`] – Signature metadata and its builder.
//! * [`validation`] – Validation rules and the registrar merging them into metadata.
//! * [`config`] – Engine settings.
//!
//! ## Metadata
//! Metadata lives in a side table owned by the engine and keyed by callable
//! identity, never by name. It is created lazily on first resolution (holding the
//! parameter order only) or explicitly through [`engine::Engine::describe_with`],
//! and it is amended by [`engine::Engine::add_validations`].
//!
//! ## Falsy values
//! By default a present but falsy value (`0`, `""`, `false`) counts as no value at
//! all: it fails a declared type and reaches the callable as `Null`. Validation
//! rules still see the value as supplied. It stays
//! the default for compatibility. Set
//! [`config::FalsyPolicy::Preserve`] to have only `Null` count as missing.
//!
//! ## Quick Start
//! ```
//! use namedcall::named;
//! use namedcall::datatype::{Callable, Value};
//! use namedcall::engine::Engine;
//! use namedcall::metadata::ParameterSpec;
//!
//! let engine = Engine::new();
//! let greet = Value::from(Callable::with_source("fn greet(greeting, name)", |_, args| {
//!     Ok(Value::from(format!("{}, {}!", args[0], args[1])))
//! }));
//! let result = engine
//!     .invoke_named(&greet, &Value::Null, &named! { "name" => "Ada", "greeting" => "Hello" })
//!     .unwrap();
//! assert_eq!(result, Value::from("Hello, Ada!"));
//!
//! engine
//!     .describe_with(&greet, &[
//!         ParameterSpec::new("greeting").typed("string").default_value("Hi"),
//!         ParameterSpec::new("name").typed("string"),
//!     ])
//!     .unwrap();
//! let result = engine.invoke_named(&greet, &Value::Null, &named! { "name" => "Bo" }).unwrap();
//! assert_eq!(result, Value::from("Hi, Bo!"));
//! ```

pub mod config;
pub mod datatype;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod signature;
pub mod validation;

pub use error::{NamedCallError, Result};
