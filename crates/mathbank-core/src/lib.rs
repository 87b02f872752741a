//! mathbank-core: question generation, answer verification and dataset
//! normalization for a K-8 math curriculum.
//!
//! The curriculum is a JSON array of question sets. This crate generates new
//! sets from TOML skill files, checks stored answers against the arithmetic
//! in the question text, merges duplicate sets, repairs malformed
//! multiple-choice questions and audits the result.

pub mod audit;
pub mod config;
pub mod distractor;
pub mod document;
pub mod error;
pub mod extract;
pub mod generator;
pub mod issue;
pub mod model;
pub mod normalize;
pub mod report;
pub mod skills;
pub mod value;
pub mod verify;
