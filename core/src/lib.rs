pub mod catalog;
pub mod completeness;
pub mod error;
pub mod interview;
pub mod nlu;
