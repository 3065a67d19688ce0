use crate::error::Result;
use crate::logging::{Fields, Logger};
use crate::models::question::{NewQuestion, Question, QuestionFilter};
use crate::utils::validation::validate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

pub(crate) const QUESTION_COLUMNS: &str = "id, candidate_id, title, description, difficulty, \
     category, test_cases, solution_code, solution_explanation, follow_ups, estimated_time, tags, \
     personalization_context, generation_prompt, llm_model, generation_cost, created_at";

const MAX_LIST_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
    log: Logger,
}

impl QuestionService {
    pub fn new(pool: PgPool, log: Logger) -> Self {
        Self { pool, log }
    }

    /// Records a generated question. Difficulty and category are checked
    /// here; the table stores them as plain strings.
    pub async fn create(&self, new: NewQuestion) -> Result<Question> {
        validate(&new)?;
        let id = new.id.unwrap_or_else(Uuid::new_v4);

        let question = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (
                id, candidate_id, title, description, difficulty, category,
                test_cases, solution_code, solution_explanation, follow_ups,
                estimated_time, tags, personalization_context,
                generation_prompt, llm_model, generation_cost
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7::json, $8, $9, $10::json, $11, $12, $13, $14, $15, $16)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new.candidate_id)
        .bind(new.title.trim())
        .bind(new.description.trim())
        .bind(new.normalized_difficulty())
        .bind(&new.category)
        .bind(&new.test_cases)
        .bind(&new.solution_code)
        .bind(&new.solution_explanation)
        .bind(&new.follow_ups)
        .bind(new.estimated_time)
        .bind(&new.tags)
        .bind(&new.personalization_context)
        .bind(&new.generation_prompt)
        .bind(&new.llm_model)
        .bind(new.generation_cost)
        .fetch_one(&self.pool)
        .await?;

        self.log.info(
            "question stored",
            Fields::new()
                .with("question_id", question.id)
                .with("candidate_id", question.candidate_id)
                .with("difficulty", &question.difficulty)
                .with("category", &question.category)
                .with("llm_model", &question.llm_model)
                .with("generation_cost", question.generation_cost),
        );
        Ok(question)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    /// Newest first, optionally narrowed by difficulty and category.
    pub async fn list(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"
        ));
        if let Some(difficulty) = filter.difficulty {
            qb.push(" AND difficulty = ").push_bind(difficulty.as_str());
        }
        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        qb.push(" ORDER BY created_at DESC, id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit.clamp(1, MAX_LIST_LIMIT));
        }

        let questions = qb.build_query_as::<Question>().fetch_all(&self.pool).await?;
        Ok(questions)
    }

    pub async fn list_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE candidate_id = $1 ORDER BY created_at, id"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    /// Bank questions: those not tied to any candidate, including ones whose
    /// candidate was deleted.
    pub async fn list_unassigned(&self) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE candidate_id IS NULL ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }
}
