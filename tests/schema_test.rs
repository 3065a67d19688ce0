//! Runs against the Postgres named by `DATABASE_URL` (or `.env`).
//! Ignored by default; run with `cargo test --test schema_test -- --ignored`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use questioncraft_backend::{
    config::Settings,
    database::run_migrations,
    error::Error,
    logging::Logging,
    models::{
        candidate::{CandidateUpdate, NewCandidate},
        candidate_profile::{Education, NewCandidateProfile, WorkHistoryEntry},
        question::{Difficulty, NewQuestion, QuestionFilter},
    },
    AppState,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn setup() -> AppState {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let vars = HashMap::from([
        ("SECRET_KEY", "test_secret_key".to_string()),
        ("DATABASE_URL", database_url.clone()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
    ]);
    let settings = Arc::new(
        Settings::from_lookup(|k| vars.get(k).cloned()).expect("settings"),
    );
    let logging = Logging::init(&settings);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .expect("pool");
    run_migrations(&pool).await.expect("migrations");

    AppState::new(pool, settings, logging)
}

fn unique_email(prefix: &str) -> String {
    format!("{}+{}@x.com", prefix, Uuid::new_v4().simple())
}

fn candidate(name: &str, email: &str) -> NewCandidate {
    NewCandidate {
        name: name.into(),
        email: email.into(),
        ..Default::default()
    }
}

fn question(candidate_id: Option<Uuid>, title: &str, difficulty: &str) -> NewQuestion {
    NewQuestion {
        candidate_id,
        title: title.into(),
        description: format!("{} and explain the complexity.", title),
        difficulty: difficulty.into(),
        category: "algorithms".into(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn candidate_gets_id_and_timestamps() {
    let state = setup().await;
    let svc = &state.candidate_service;

    let created = svc
        .create(candidate("Ada", &unique_email("ada")))
        .await
        .expect("create");
    assert!(!created.id.is_nil());
    let created_at = created.created_at.expect("created_at set");
    let first_update = created.updated_at.expect("updated_at set");

    let supplied = Uuid::new_v4();
    let explicit = svc
        .create(NewCandidate {
            id: Some(supplied),
            ..candidate("Grace", &unique_email("grace"))
        })
        .await
        .expect("create with id");
    assert_eq!(explicit.id, supplied);

    let updated = svc
        .update(
            created.id,
            CandidateUpdate {
                phone: Some("+44 20 7946 0000".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.phone.as_deref(), Some("+44 20 7946 0000"));
    assert_eq!(updated.name, "Ada");
    assert_eq!(updated.created_at, Some(created_at));
    assert!(updated.updated_at.expect("updated_at") > first_update);

    let fetched = svc.get_by_email(&created.email).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn duplicate_email_is_a_conflict() {
    let state = setup().await;
    let svc = &state.candidate_service;
    let email = unique_email("dup");

    svc.create(candidate("First", &email)).await.expect("first insert");
    let second = svc.create(candidate("Second", &email)).await;
    assert!(matches!(second, Err(Error::Conflict(_))), "{second:?}");

    svc.create(candidate("Third", &unique_email("dup")))
        .await
        .expect("distinct email inserts");
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn invalid_payloads_never_reach_the_database() {
    let state = setup().await;

    let bad_email = state
        .candidate_service
        .create(candidate("Nobody", "not-an-email"))
        .await;
    assert!(matches!(bad_email, Err(Error::Validation(_))));

    let bad_difficulty = state
        .question_service
        .create(question(None, "Impossible", "brutal"))
        .await;
    assert!(matches!(bad_difficulty, Err(Error::Validation(_))));
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn blank_required_text_is_rejected() {
    let state = setup().await;
    let email = unique_email("blank");

    let blank_name = state
        .candidate_service
        .create(candidate("   ", &email))
        .await;
    assert!(matches!(blank_name, Err(Error::Validation(_))));
    assert!(state
        .candidate_service
        .get_by_email(&email)
        .await
        .unwrap()
        .is_none());

    let existing = state
        .candidate_service
        .create(candidate("Grace Hopper", &email))
        .await
        .unwrap();
    let blank_update = state
        .candidate_service
        .update(
            existing.id,
            CandidateUpdate {
                name: Some("\t ".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank_update, Err(Error::Validation(_))));
    let unchanged = state.candidate_service.get(existing.id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "Grace Hopper");

    let blank_title = state
        .question_service
        .create(question(None, "   ", "easy"))
        .await;
    assert!(matches!(blank_title, Err(Error::Validation(_))));

    let blank_description = state
        .question_service
        .create(NewQuestion {
            description: " ".into(),
            ..question(None, "Two sum", "easy")
        })
        .await;
    assert!(matches!(blank_description, Err(Error::Validation(_))));

    state.candidate_service.delete(existing.id).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn profile_requires_existing_candidate_and_is_unique() {
    let state = setup().await;

    let orphan = state
        .profile_service
        .create(NewCandidateProfile {
            candidate_id: Uuid::new_v4(),
            ..Default::default()
        })
        .await;
    assert!(matches!(orphan, Err(Error::InvalidReference(_))), "{orphan:?}");

    let owner = state
        .candidate_service
        .create(candidate("Linus", &unique_email("linus")))
        .await
        .unwrap();
    state
        .profile_service
        .create(NewCandidateProfile {
            candidate_id: owner.id,
            ..Default::default()
        })
        .await
        .expect("first profile");
    let second = state
        .profile_service
        .create(NewCandidateProfile {
            candidate_id: owner.id,
            ..Default::default()
        })
        .await;
    assert!(matches!(second, Err(Error::Conflict(_))), "{second:?}");
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn question_for_unknown_candidate_is_rejected() {
    let state = setup().await;
    let result = state
        .question_service
        .create(question(Some(Uuid::new_v4()), "Dangling", "easy"))
        .await;
    assert!(matches!(result, Err(Error::InvalidReference(_))), "{result:?}");
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn deleting_candidate_removes_profile_and_keeps_questions() {
    let state = setup().await;

    let ada = state
        .candidate_service
        .create(candidate("Ada", &unique_email("ada")))
        .await
        .unwrap();

    let profile = state
        .profile_service
        .create(NewCandidateProfile {
            candidate_id: ada.id,
            skills: vec!["Python".into()],
            experience_years: Some(9),
            education: vec![Education {
                degree: "BS".into(),
                field: "CS".into(),
            }],
            work_history: vec![WorkHistoryEntry {
                company: "Analytical Engines".into(),
                role: "SWE".into(),
            }],
            domain_expertise: vec!["fintech".into()],
            seniority_level: Some("senior".into()),
            strengths: vec!["clear communicator".into()],
            knowledge_gaps: vec!["distributed systems".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let q = state
        .question_service
        .create(NewQuestion {
            test_cases: Some(json!([{ "input": [1, 2, 3], "expected": [3, 2, 1] }])),
            follow_ups: Some(json!(["Can you do it recursively?"])),
            estimated_time: Some(15),
            tags: vec!["lists".into()],
            llm_model: Some("gpt-4o".into()),
            generation_cost: Some(0.0042),
            ..question(Some(ada.id), "Reverse a list", "easy")
        })
        .await
        .unwrap();

    let related = state
        .candidate_service
        .profile_of(ada.id)
        .await
        .unwrap()
        .expect("profile via candidate");
    assert_eq!(related.id, profile.id);
    assert_eq!(related.skills(), ["Python".to_string()]);
    assert_eq!(related.seniority_level.as_deref(), Some("senior"));
    assert_eq!(related.education.as_ref().unwrap().0[0].field, "CS");
    assert_eq!(
        related.strengths.as_deref(),
        Some(&["clear communicator".to_string()][..])
    );

    let detail = state.candidate_service.get_detail(ada.id).await.unwrap();
    assert_eq!(detail.questions.len(), 1);
    assert_eq!(detail.questions[0].id, q.id);
    assert_eq!(detail.questions[0].difficulty, "easy");
    assert_eq!(detail.questions[0].category, "algorithms");

    assert!(state.candidate_service.delete(ada.id).await.unwrap());
    assert!(!state.candidate_service.delete(ada.id).await.unwrap());

    assert!(state.profile_service.get(profile.id).await.unwrap().is_none());
    let survivor = state
        .question_service
        .get(q.id)
        .await
        .unwrap()
        .expect("question outlives its candidate");
    assert_eq!(survivor.candidate_id, None);
    assert_eq!(survivor.title, "Reverse a list");
    assert_eq!(survivor.generation_cost, Some(0.0042));

    let unassigned = state.question_service.list_unassigned().await.unwrap();
    assert!(unassigned.iter().any(|u| u.id == q.id));

    let missing = state.candidate_service.get_detail(ada.id).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
#[ignore = "needs a live Postgres at DATABASE_URL"]
async fn questions_filter_by_difficulty() {
    let state = setup().await;
    let hard = state
        .question_service
        .create(question(None, "Design a rate limiter", "Hard"))
        .await
        .unwrap();
    assert_eq!(hard.difficulty, "hard");

    let found = state
        .question_service
        .list(&QuestionFilter {
            difficulty: Some(Difficulty::Hard),
            category: Some("algorithms".into()),
            limit: Some(50),
        })
        .await
        .unwrap();
    assert!(found.iter().all(|q| q.difficulty == "hard"));
    assert!(found.iter().any(|q| q.id == hard.id));
}
