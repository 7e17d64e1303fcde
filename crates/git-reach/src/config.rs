//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::ReachError;

/// Environment variable overriding [`ReachConfig::use_generation_numbers`].
pub const ENV_GENERATION_NUMBERS: &str = "GITR_GENERATION_NUMBERS";

/// Environment variable overriding [`ReachConfig::ignore_missing_commits`].
pub const ENV_IGNORE_MISSING_COMMITS: &str = "GITR_IGNORE_MISSING_COMMITS";

/// Knobs for a [`Reachability`](crate::Reachability) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReachConfig {
    /// Use generation numbers from the provider for ordering and pruning
    /// (the `core.commitGraph` switch). When off, every commit is treated
    /// as having an unknown generation.
    pub use_generation_numbers: bool,

    /// Treat a commit that cannot be loaded as "not an ancestor" in
    /// ancestry checks instead of failing the query.
    pub ignore_missing_commits: bool,
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            use_generation_numbers: true,
            ignore_missing_commits: false,
        }
    }
}

impl ReachConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Result<Self, ReachError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ReachError> {
        if let Some(v) = lookup(ENV_GENERATION_NUMBERS) {
            self.use_generation_numbers = parse_bool(ENV_GENERATION_NUMBERS, &v)?;
        }
        if let Some(v) = lookup(ENV_IGNORE_MISSING_COMMITS) {
            self.ignore_missing_commits = parse_bool(ENV_IGNORE_MISSING_COMMITS, &v)?;
        }
        Ok(self)
    }
}

/// Boolean spelling accepted by git config: true/yes/on, false/no/off,
/// integers (non-zero is true), and the empty string for false.
fn parse_bool(key: &str, value: &str) -> Result<bool, ReachError> {
    let s = value.trim();
    if s.is_empty() {
        return Ok(false);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => s
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| ReachError::Config(format!("{key}: invalid boolean '{s}'"))),
    }
}
