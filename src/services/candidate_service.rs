use crate::error::{Error, Result};
use crate::logging::{Fields, Logger};
use crate::models::candidate::{Candidate, CandidateDetail, CandidateUpdate, NewCandidate};
use crate::models::candidate_profile::CandidateProfile;
use crate::models::question::Question;
use crate::services::profile_service::PROFILE_COLUMNS;
use crate::services::question_service::QUESTION_COLUMNS;
use crate::utils::validation::validate;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const CANDIDATE_COLUMNS: &str =
    "id, name, email, phone, resume_url, resume_text, created_at, updated_at";

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
    log: Logger,
}

impl CandidateService {
    pub fn new(pool: PgPool, log: Logger) -> Self {
        Self { pool, log }
    }

    /// Inserts a candidate. A duplicate email surfaces as `Error::Conflict`.
    pub async fn create(&self, new: NewCandidate) -> Result<Candidate> {
        validate(&new)?;
        let id = new.id.unwrap_or_else(Uuid::new_v4);

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            INSERT INTO candidates (id, name, email, phone, resume_url, resume_text)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CANDIDATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new.name.trim())
        .bind(new.email.trim())
        .bind(&new.phone)
        .bind(&new.resume_url)
        .bind(&new.resume_text)
        .fetch_one(&self.pool)
        .await?;

        self.log.info(
            "candidate created",
            Fields::new().with("candidate_id", candidate.id),
        );
        Ok(candidate)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE email = $1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    pub async fn list(&self) -> Result<Vec<Candidate>> {
        let candidates = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    /// Applies the non-empty fields of `update`; `updated_at` is refreshed by
    /// the table trigger.
    pub async fn update(&self, id: Uuid, update: CandidateUpdate) -> Result<Candidate> {
        validate(&update)?;
        if update.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)));
        }

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                resume_url = COALESCE($4, resume_url),
                resume_text = COALESCE($5, resume_text)
            WHERE id = $1
            RETURNING {CANDIDATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.phone)
        .bind(&update.resume_url)
        .bind(&update.resume_text)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;
        Ok(candidate)
    }

    pub async fn update_resume(
        &self,
        id: Uuid,
        resume_url: String,
        resume_text: Option<String>,
    ) -> Result<Candidate> {
        self.update(
            id,
            CandidateUpdate {
                resume_url: Some(resume_url),
                resume_text,
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes the candidate. Its profile goes with it; questions stay and
    /// lose their candidate reference. Returns `false` when nothing matched.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            self.log
                .info("candidate deleted", Fields::new().with("candidate_id", id));
        }
        Ok(deleted)
    }

    pub async fn profile_of(&self, id: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM candidate_profiles WHERE candidate_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn questions_of(&self, id: Uuid) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE candidate_id = $1 ORDER BY created_at, id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<CandidateDetail> {
        let candidate = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;
        let (profile, questions) = tokio::try_join!(self.profile_of(id), self.questions_of(id))?;
        Ok(CandidateDetail {
            candidate,
            profile,
            questions,
        })
    }
}
