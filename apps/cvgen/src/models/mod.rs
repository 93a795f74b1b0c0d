// CV data handed to the exporter and the placeholder views built over it.

pub mod candidate;

pub use candidate::{Candidate, CandidateFields, EducationFields, Locale, Work, WorkFields};
