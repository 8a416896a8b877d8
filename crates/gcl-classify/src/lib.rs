//! Sustainability classification for the GreenChoice Ledger.
//!
//! The ledger treats classifiers as black boxes that turn product text into
//! an [`Assessment`]: a score in `[-10, 10]`, a grade, detected materials,
//! and footprint estimates. This crate defines that boundary and ships:
//!
//! - [`HeuristicClassifier`] -- deterministic keyword weights, never fails
//! - [`ModelClassifier`] -- an OpenAI-compatible chat-completions model
//! - [`FallbackClassifier`] -- wraps any classifier and answers with the
//!   heuristic whenever it is unavailable
//!
//! [`ClassifierConfig::build`] picks between them from configuration.

pub mod assessment;
pub mod config;
pub mod error;
pub mod fallback;
pub mod heuristic;
pub mod model;
pub mod traits;

pub use assessment::{Assessment, Grade, Source, MAX_SCORE, MIN_SCORE};
pub use config::ClassifierConfig;
pub use error::{ClassifyError, ClassifyResult};
pub use fallback::{FallbackClassifier, DEFAULT_TIMEOUT};
pub use heuristic::HeuristicClassifier;
pub use model::{ModelClassifier, ModelConfig};
pub use traits::Classifier;
