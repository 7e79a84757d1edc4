pub mod approvals;
pub mod health;
pub mod interview;
pub mod preferences;
pub mod profile;
