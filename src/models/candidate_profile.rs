use crate::utils::validation::validate_no_blank_items;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
}

/// Analysed view of one candidate. Lives and dies with its candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub skills: Option<Json<Vec<String>>>,
    pub experience_years: Option<i32>,
    pub education: Option<Json<Vec<Education>>>,
    pub work_history: Option<Json<Vec<WorkHistoryEntry>>>,
    pub domain_expertise: Option<Json<Vec<String>>>,
    pub seniority_level: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub knowledge_gaps: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    pub fn skills(&self) -> &[String] {
        self.skills.as_ref().map(|j| j.0.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewCandidateProfile {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub candidate_id: Uuid,
    #[serde(default)]
    #[validate(custom(function = "validate_no_blank_items"))]
    pub skills: Vec<String>,
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub work_history: Vec<WorkHistoryEntry>,
    #[serde(default)]
    pub domain_expertise: Vec<String>,
    #[validate(length(min = 1, max = 50))]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub knowledge_gaps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_payload_validation() {
        let ok = NewCandidateProfile {
            candidate_id: Uuid::new_v4(),
            skills: vec!["Python".into()],
            seniority_level: Some("senior".into()),
            experience_years: Some(7),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = NewCandidateProfile {
            skills: vec!["".into()],
            experience_years: Some(-1),
            ..ok
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("skills"));
        assert!(fields.contains_key("experience_years"));
    }

    #[test]
    fn education_tolerates_partial_entries() {
        let parsed: Vec<Education> = serde_json::from_str(r#"[{"degree": "BS"}]"#).unwrap();
        assert_eq!(parsed[0].degree, "BS");
        assert_eq!(parsed[0].field, "");
    }
}
