pub mod analyze;
pub mod apis;
pub mod explanation;
pub mod sessions;
pub mod transcript;
