use crate::error::Result;
use crate::logging::{Fields, Logger};
use crate::models::candidate_profile::{CandidateProfile, NewCandidateProfile};
use crate::utils::validation::validate;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const PROFILE_COLUMNS: &str = "id, candidate_id, skills, experience_years, education, \
     work_history, domain_expertise, seniority_level, strengths, knowledge_gaps, created_at";

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
    log: Logger,
}

impl ProfileService {
    pub fn new(pool: PgPool, log: Logger) -> Self {
        Self { pool, log }
    }

    /// Stores the analysed profile. A second profile for the same candidate
    /// is a `Conflict`; an unknown candidate is an `InvalidReference`.
    pub async fn create(&self, new: NewCandidateProfile) -> Result<CandidateProfile> {
        validate(&new)?;
        let id = new.id.unwrap_or_else(Uuid::new_v4);

        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            r#"
            INSERT INTO candidate_profiles (
                id, candidate_id, skills, experience_years, education, work_history,
                domain_expertise, seniority_level, strengths, knowledge_gaps
            )
            VALUES ($1, $2, $3::json, $4, $5::json, $6::json, $7::json, $8, $9, $10)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new.candidate_id)
        .bind(Json(&new.skills))
        .bind(new.experience_years)
        .bind(Json(&new.education))
        .bind(Json(&new.work_history))
        .bind(Json(&new.domain_expertise))
        .bind(new.seniority_level.as_deref().map(|s| s.trim().to_ascii_lowercase()))
        .bind(&new.strengths)
        .bind(&new.knowledge_gaps)
        .fetch_one(&self.pool)
        .await?;

        self.log.info(
            "candidate profile stored",
            Fields::new()
                .with("candidate_id", profile.candidate_id)
                .with("seniority_level", &profile.seniority_level)
                .with("skills", profile.skills().len()),
        );
        Ok(profile)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM candidate_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn get_for_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM candidate_profiles WHERE candidate_id = $1"
        ))
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}
