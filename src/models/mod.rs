pub mod candidate;
pub mod candidate_profile;
pub mod question;
