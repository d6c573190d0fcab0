// Transcript analysis: prompt construction, completion parsing, and score aggregation.
// All completion calls go through llm_client; nothing in here performs I/O.

pub mod models;
pub mod parser;
pub mod prompts;
pub mod scoring;

pub use models::{AggregateScore, AnalysisResult, EvaluationRecord};
