pub mod explanation;
pub mod validation;
