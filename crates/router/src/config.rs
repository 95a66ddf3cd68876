//! Router-wide options, loadable from any serde format or built in code.

use crate::RouterError;
use crate::pattern::{Defaults, Rules};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default bound on how deeply route definitions may nest.
pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterOptions {
    /// prepended to every route path
    pub prefix: String,
    /// fallback for routes that do not set `strict` themselves
    pub strict: bool,
    pub rules: Rules,
    pub defaults: Defaults,
    pub max_depth: usize,
    /// disables route middleware for every dispatch
    pub skip_middleware: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            strict: false,
            rules: Rules::new(),
            defaults: Defaults::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            skip_middleware: false,
        }
    }
}

impl RouterOptions {
    pub fn builder() -> RouterOptionsBuilder {
        RouterOptionsBuilder { options: Self::default() }
    }

    /// Parses options from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, RouterError> {
        serde_json::from_str(json).map_err(|e| RouterError::configuration(format!("invalid router options: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptionsBuilder {
    options: RouterOptions,
}

impl RouterOptionsBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn rule(mut self, param: impl Into<String>, rule: impl Into<String>) -> Self {
        self.options.rules.insert(param.into(), rule.into());
        self
    }

    pub fn default_value(mut self, param: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.defaults.insert(param.into(), value.into());
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn skip_middleware(mut self, skip: bool) -> Self {
        self.options.skip_middleware = skip;
        self
    }

    pub fn build(self) -> RouterOptions {
        self.options
    }
}
