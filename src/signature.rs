//! Signature resolution: the ordered parameter names of a callable.
//!
//! An explicitly declared order always wins. Without one, the names are read
//! from the callable's source text, if it has any: comments are stripped, the
//! first parenthesized list is located (see `signature.pest`), entries are split
//! on commas and trimmed, and empty entries are dropped. The outcome is cached in
//! the engine's side table so later resolutions do not parse again.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use pest::Parser;
use pest::error::LineColLocation;
use pest_derive::Parser;
use regex::Regex;
use tracing::debug;

use crate::datatype::{Callable, Value};
use crate::engine::{Engine, callable_of};
use crate::error::{NamedCallError, Result};

lazy_static! {
    static ref COMMENTS: Regex = Regex::new(r"(?m)(//.*$)|(/\*[\s\S]*?\*/)").unwrap();
}

#[derive(Parser)]
#[grammar = "signature.pest"]
struct SignatureParser;

fn parse_error(e: pest::error::Error<Rule>) -> NamedCallError {
    let (line, col) = match e.line_col {
        LineColLocation::Pos((line, col)) => (line, col),
        LineColLocation::Span((line, col), _) => (line, col),
    };
    NamedCallError::Parse {
        message: format!("no parameter list found: {}", e.variant.message()),
        line: Some(line),
        col: Some(col),
    }
}

pub fn strip_comments(text: &str) -> Cow<'_, str> {
    COMMENTS.replace_all(text, "")
}

// Type annotations and receivers are not parameter names.
fn parameter_name(raw: &str) -> Option<String> {
    let name = raw.split(':').next().unwrap_or(raw).trim();
    let name = name.strip_prefix("mut ").unwrap_or(name).trim();
    match name {
        "" | "self" | "&self" | "&mut self" => None,
        _ => Some(name.to_string()),
    }
}

/// Reads the parameter names out of a textual definition such as
/// `function add(a, /* b, */ c)` or `fn add(a: i64, c: i64)`.
pub fn infer_parameter_order(source: &str) -> Result<Vec<String>> {
    let stripped = strip_comments(source);
    let signature = SignatureParser::parse(Rule::signature, &stripped)
        .map_err(parse_error)?
        .next()
        .ok_or_else(|| NamedCallError::Parse {
            message: "empty signature".to_string(),
            line: None,
            col: None,
        })?;
    Ok(signature
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::parameters)
        .flat_map(|pair| pair.into_inner())
        .filter_map(|pair| parameter_name(pair.as_str()))
        .collect())
}

pub(crate) fn check_names(names: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(NamedCallError::InvalidSpecification(
                "parameter name must be a non-empty string".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(NamedCallError::InvalidSpecification(format!(
                "parameter '{}' is declared more than once",
                name
            )));
        }
    }
    Ok(())
}

impl Engine {
    pub fn resolve_parameter_order(&self, target: &Value) -> Result<Vec<String>> {
        self.resolve(callable_of(target)?)
    }

    /// Declares the order explicitly. It overrides inference from then on.
    pub fn declare_parameter_order<I, S>(&self, target: &Value, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let callable = callable_of(target)?;
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        check_names(&names)?;
        let mut signatures = self.signatures()?;
        Arc::make_mut(signatures.entry(callable.id()).or_default()).parameter_order = Some(names);
        Ok(())
    }

    pub(crate) fn resolve(&self, callable: &Callable) -> Result<Vec<String>> {
        if let Some(order) = self
            .signatures()?
            .get(&callable.id())
            .and_then(|metadata| metadata.parameter_order.clone())
        {
            return Ok(order);
        }
        // parse outside the lock, then assign the completed order in one go
        let inferred = self.infer(callable)?;
        let mut signatures = self.signatures()?;
        let metadata = signatures.entry(callable.id()).or_default();
        if metadata.parameter_order.is_none() {
            Arc::make_mut(metadata).parameter_order = Some(inferred.clone());
            return Ok(inferred);
        }
        Ok(metadata.parameter_order().to_vec())
    }

    fn infer(&self, callable: &Callable) -> Result<Vec<String>> {
        match callable.source() {
            Some(source) if self.config.infer_signatures => {
                debug!(callable = callable.name(), "inferring parameter order from source text");
                infer_parameter_order(source)
            }
            _ => Err(NamedCallError::UndeclaredSignature(callable.name().to_string())),
        }
    }
}
