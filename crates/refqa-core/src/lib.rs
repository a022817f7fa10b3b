//! Prompts, controllers, answer-set scoring, and configuration for refqa.
//!
//! [`bootstrap::Pipeline`] wires a provider and an index backend into the two
//! controllers: [`InitializationController`] builds per-category indexes from
//! reference files, [`QuestionController`] answers questions against them.

pub mod answers;
pub mod assistant;
pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod error;
pub mod progress;
pub mod prompt;
pub mod secret;

pub use answers::{
    AccuracyReport, AnswerRecord, AnswerSet, GroundTruth, GroundTruthSet, Question, QuestionSet,
    score,
};
pub use assistant::Assistant;
pub use bootstrap::{Pipeline, create_index_backend, create_provider};
pub use config::Config;
pub use controller::{Answer, InitializationController, QuestionController};
pub use error::CoreError;
pub use secret::Secret;
