use crate::utils::validation::{validate_difficulty, validate_not_blank, validate_slug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// A generated interview question. `candidate_id` is a lookup reference
/// only; the question survives its candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub category: String,
    pub test_cases: Option<JsonValue>,
    pub solution_code: Option<String>,
    pub solution_explanation: Option<String>,
    pub follow_ups: Option<JsonValue>,
    /// Minutes.
    pub estimated_time: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub personalization_context: Option<String>,
    pub generation_prompt: Option<String>,
    pub llm_model: Option<String>,
    pub generation_cost: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewQuestion {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub candidate_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(length(max = 20), custom(function = "validate_difficulty"))]
    pub difficulty: String,
    #[validate(length(max = 50), custom(function = "validate_slug"))]
    pub category: String,
    pub test_cases: Option<JsonValue>,
    pub solution_code: Option<String>,
    pub solution_explanation: Option<String>,
    pub follow_ups: Option<JsonValue>,
    #[validate(range(min = 0))]
    pub estimated_time: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub personalization_context: Option<String>,
    pub generation_prompt: Option<String>,
    #[validate(length(max = 50))]
    pub llm_model: Option<String>,
    #[validate(range(min = 0.0))]
    pub generation_cost: Option<f64>,
}

impl NewQuestion {
    /// Stored difficulty, normalised to lowercase.
    pub fn normalized_difficulty(&self) -> String {
        self.difficulty
            .parse::<Difficulty>()
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|_| self.difficulty.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionFilter {
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}
