//! Core data models for identifiers and fetch outcomes.

mod identifier;
mod outcome;

pub use identifier::{extract_course_code, extract_year, strip_pdf_suffix, Strategy};
pub use outcome::{BatchEntry, BatchSummary, FetchOutcome, Status};
