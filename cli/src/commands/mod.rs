pub mod approvals;
pub mod health;
pub mod interview;
pub mod prefs;
pub mod profile;
