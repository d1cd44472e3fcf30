//! Character records and their stable identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable integer identifier for a character.
///
/// Identifiers are assigned by the model on first extraction and must stay
/// attached to the same character across refinement iterations; merging
/// relies on them as the sole notion of identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CharacterId(u64);

impl CharacterId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for CharacterId {
    /// Accepts plain integers and integral floats.
    ///
    /// Gemini structured output declares ids as NUMBER and will happily
    /// render `3` as `3.0`, so both spellings must map to the same id.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Number::deserialize(deserializer)?;
        if let Some(value) = raw.as_u64() {
            return Ok(Self(value));
        }
        if let Some(value) = raw.as_f64() {
            if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
                return Ok(Self(value as u64));
            }
        }
        Err(serde::de::Error::custom(format!(
            "character id must be a non-negative integer, got {raw}"
        )))
    }
}

/// A character extracted from the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier, preserved across refinement iterations.
    pub id: CharacterId,
    /// The name the text uses most often for this character.
    pub common_name: String,
    /// Every name the text uses, including `common_name`.
    pub names: Vec<String>,
    /// Whether this character is central to the narrative.
    pub main_character: bool,
    /// Short description, present when description extraction was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image-generation prompt, present when portraits were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_prompt: Option<String>,
}

impl Character {
    pub fn new(id: CharacterId, common_name: impl Into<String>) -> Self {
        let common_name = common_name.into();
        Self {
            id,
            names: vec![common_name.clone()],
            common_name,
            main_character: false,
            description: None,
            portrait_prompt: None,
        }
    }

    /// Add an alternate name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    /// Mark this character as a main character.
    pub fn main(mut self) -> Self {
        self.main_character = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_portrait_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.portrait_prompt = Some(prompt.into());
        self
    }

    /// Ensure `common_name` appears in `names`, prepending it if the model
    /// left it out.
    pub(crate) fn ensure_common_name_listed(&mut self) {
        if !self.names.iter().any(|name| name == &self.common_name) {
            self.names.insert(0, self.common_name.clone());
        }
    }
}
