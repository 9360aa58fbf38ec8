use crate::error::BlueprintError;
use crate::parser::DEFAULT_MAX_DEPTH;
use crate::serialization::DEFAULT_INDENTATION;
use serde::{Deserialize, Serialize};

/// Knobs for reading and writing paste text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Deepest parenthesis or object nesting accepted before `TooDeeplyNested`.
    pub max_depth: usize,
    /// Prefix of each nesting level of written object blocks.
    pub indentation: String,
    /// Whether `read_multiple` runs the sanitizer over its input.
    pub sanitize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            indentation: DEFAULT_INDENTATION.to_string(),
            sanitize: true,
        }
    }
}

impl Options {
    /// # Errors
    ///
    /// Returns `BlueprintError::Config` if the text is not valid JSON for `Options`.
    pub fn from_json(text: &str) -> Result<Self, BlueprintError> {
        serde_json::from_str::<Self>(text)
            .map_err(|e| BlueprintError::Config {
                message: e.to_string(),
            })?
            .validated()
    }

    /// # Errors
    ///
    /// Returns `BlueprintError::Config` if the text is not valid YAML for `Options`.
    pub fn from_yaml(text: &str) -> Result<Self, BlueprintError> {
        serde_yaml::from_str::<Self>(text)
            .map_err(|e| BlueprintError::Config {
                message: e.to_string(),
            })?
            .validated()
    }

    fn validated(self) -> Result<Self, BlueprintError> {
        if self.max_depth == 0 {
            return Err(BlueprintError::Config {
                message: "`max_depth` must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}
