//! # caresense-core
//!
//! Core library for CareSense - a health risk awareness questionnaire.
//!
//! This library provides:
//! - Domain types for symptom input, analysis results, and risk history
//! - Response normalization for loosely-structured model output
//! - Trend derivation against a bounded local history
//! - The hosted-model client adapter behind a mockable seam
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! One analysis flows through four stages:
//! - **Prompt:** the three input fields interpolated into a fixed template
//! - **Call:** a single completion request against the configured provider
//! - **Normalize:** any payload shape coerced into an [`AnalysisResult`]
//! - **Derive:** trend computed against the prior history, new level recorded
//!
//! ## Example
//!
//! ```rust,no_run
//! use caresense_core::{analyze, create_completion_client, Config, FileHistoryStore, SymptomInput};
//!
//! let config = Config::load().expect("failed to load config");
//! let llm = config.llm.expect("llm section is required");
//! let client = create_completion_client(&llm).expect("llm config incomplete");
//! let mut history = FileHistoryStore::default_location();
//!
//! let input = SymptomInput {
//!     symptoms: "mild headache for 2 days".into(),
//!     duration_days: 2,
//!     severity: None,
//! };
//! let outcome = analyze(&input, client.as_ref(), &mut history).expect("call failed");
//! println!("{} risk", outcome.result.risk_level.as_str());
//! ```

// Re-export commonly used items at the crate root
pub use analysis::{analyze, build_prompt, create_completion_client, AnalysisOutcome, CompletionClient};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{FileHistoryStore, HistoryStore, MemoryHistoryStore, MAX_HISTORY_ENTRIES};
pub use normalize::{normalize, NormalizedPayload, DEFAULT_DISCLAIMER};
pub use trend::risk_trend;
pub use types::*;

// Public modules
pub mod analysis;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod trend;
pub mod types;
