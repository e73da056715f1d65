//! Child-profile form data and its validation.

use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

pub const MISSING_REQUIRED_FIELDS: &str = "Child name and age are required";

/// Request body for `POST /generate-story`, as submitted by the form.
/// Every field is optional at this layer so that a missing field becomes a
/// validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRequest {
    #[serde(default)]
    pub child_name: Option<String>,
    /// The form sends an age range string ("3-5"); plain numbers are accepted too,
    /// except `0`, which counts as missing.
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub learning_goals: Option<String>,
    #[serde(default)]
    pub emotions: Option<String>,
}

/// A validated profile: required fields are non-empty and empty optional
/// fields have been dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryProfile {
    pub child_name: String,
    pub age: String,
    pub interests: Option<String>,
    pub learning_goals: Option<String>,
    pub emotions: Option<String>,
}

impl StoryRequest {
    pub fn validate(self) -> Result<StoryProfile, AppError> {
        match (non_empty(self.child_name), non_empty(self.age)) {
            (Some(child_name), Some(age)) => Ok(StoryProfile {
                child_name,
                age,
                interests: non_empty(self.interests),
                learning_goals: non_empty(self.learning_goals),
                emotions: non_empty(self.emotions),
            }),
            _ => Err(AppError::Validation(MISSING_REQUIRED_FIELDS.to_string())),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.and_then(|raw| match raw {
        Raw::Text(text) => Some(text),
        Raw::Number(number) if number.as_f64() == Some(0.0) => None,
        Raw::Number(number) => Some(number.to_string()),
    }))
}
