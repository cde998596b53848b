//! Arabic quiz question-bank toolkit: batch generation against a chain of
//! LLM providers, validation and canonicalization of the returned items,
//! signature-based dedup, checkpointed persistence, and a merge/normalize
//! tool for folding new batches into the main corpus.

pub mod canon;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod extract;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod schema;
pub mod store;
pub mod textnorm;
pub mod validate;
