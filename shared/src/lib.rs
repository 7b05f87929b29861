pub mod candidate;
pub mod templates;
