//! Checker options.
//!
//! Options mirror the compiler flags that change the relation rules. They
//! can be built in code or read from a JSON document that uses the familiar
//! `camelCase` flag names:
//!
//! ```json
//! { "strictNullChecks": true, "exactOptionalPropertyTypes": true }
//! ```
//!
//! Missing keys fall back to the defaults (strict mode, non-exact optional
//! properties).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flags consulted by the relation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CheckerOptions {
    /// `null` and `undefined` are only assignable to types that mention them.
    pub strict_null_checks: bool,
    /// Function parameters are compared contravariantly instead of bivariantly.
    pub strict_function_types: bool,
    /// Optional properties do not implicitly accept `undefined`.
    pub exact_optional_property_types: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            strict_null_checks: true,
            strict_function_types: true,
            exact_optional_property_types: false,
        }
    }
}

/// Failure to load [`CheckerOptions`].
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid checker options: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CheckerOptions {
    /// Options with every strictness flag turned off.
    pub fn loose() -> Self {
        Self {
            strict_null_checks: false,
            strict_function_types: false,
            exact_optional_property_types: false,
        }
    }

    /// Parse options from a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse options from the `compilerOptions` member of a JSON document,
    /// ignoring unrelated members.
    pub fn from_compiler_options(text: &str) -> Result<Self, OptionsError> {
        let document: serde_json::Value = serde_json::from_str(text)?;
        match document.get("compilerOptions") {
            Some(section) => {
                let mut options = Self::default();
                if let Some(flag) = section.get("strictNullChecks").and_then(|v| v.as_bool()) {
                    options.strict_null_checks = flag;
                }
                if let Some(flag) = section
                    .get("strictFunctionTypes")
                    .and_then(|v| v.as_bool())
                {
                    options.strict_function_types = flag;
                }
                if let Some(flag) = section
                    .get("exactOptionalPropertyTypes")
                    .and_then(|v| v.as_bool())
                {
                    options.exact_optional_property_types = flag;
                }
                Ok(options)
            }
            None => Ok(Self::default()),
        }
    }
}
