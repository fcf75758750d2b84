//! Engine settings, read from an optional file plus `NAMEDCALL_*` environment variables.
//!
//! ```toml
//! # namedcall.toml
//! falsy = "preserve"
//! infer_signatures = false
//! ```

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::datatype::Value;
use crate::error::Result;

/// How present-but-falsy argument values (`0`, `""`, `false`) are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalsyPolicy {
    /// Falsy values count as "no value": they trip required checks and are
    /// passed on as `Null`.
    #[default]
    Collapse,
    /// Only `Null` counts as "no value"; falsy values pass through literally.
    Preserve,
}

impl FalsyPolicy {
    pub fn usable<'v>(&self, value: Option<&'v Value>) -> Option<&'v Value> {
        match self {
            FalsyPolicy::Collapse => value.filter(|v| v.is_truthy()),
            FalsyPolicy::Preserve => value.filter(|v| !v.is_null()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub falsy: FalsyPolicy,
    /// Allow parameter names to be inferred from a callable's source text.
    pub infer_signatures: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            falsy: FalsyPolicy::default(),
            infer_signatures: true,
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "NAMEDCALL";

    /// Missing files are fine, the defaults apply.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(Self::ENV_PREFIX))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
