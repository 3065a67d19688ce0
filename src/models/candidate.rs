use crate::models::candidate_profile::CandidateProfile;
use crate::models::question::Question;
use crate::utils::validation::validate_not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub resume_text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewCandidate {
    /// Generated at insert when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub resume_text: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CandidateUpdate {
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub resume_text: Option<String>,
}

impl CandidateUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.resume_url.is_none()
            && self.resume_text.is_none()
    }
}

/// A candidate together with the rows it owns or is referenced by,
/// assembled from separate queries.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub profile: Option<CandidateProfile>,
    pub questions: Vec<Question>,
}
