pub mod occurrences;
pub mod region;
pub mod validate;
