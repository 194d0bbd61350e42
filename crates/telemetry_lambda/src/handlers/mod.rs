pub mod actuation;
pub mod query;
