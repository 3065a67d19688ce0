pub mod candidate_service;
pub mod profile_service;
pub mod question_service;
