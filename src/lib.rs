pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Settings;
use crate::logging::Logging;
use crate::services::{
    candidate_service::CandidateService, profile_service::ProfileService,
    question_service::QuestionService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub logging: Logging,
    pub candidate_service: CandidateService,
    pub profile_service: ProfileService,
    pub question_service: QuestionService,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Arc<Settings>, logging: Logging) -> Self {
        let candidate_service =
            CandidateService::new(pool.clone(), logging.logger("questioncraft.candidates"));
        let profile_service =
            ProfileService::new(pool.clone(), logging.logger("questioncraft.profiles"));
        let question_service =
            QuestionService::new(pool.clone(), logging.logger("questioncraft.questions"));

        Self {
            pool,
            settings,
            logging,
            candidate_service,
            profile_service,
            question_service,
        }
    }
}
