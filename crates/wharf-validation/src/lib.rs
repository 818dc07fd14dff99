#![forbid(unsafe_code)]

pub mod audit;
pub mod envelope;
pub mod result_store;
pub mod taxonomy;
pub mod validation_error;
pub mod validation_issue;
