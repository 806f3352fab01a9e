//! State Classifier: snapshot in, one of seven cognitive states out.
//!
//! Transition records are an audit trail only. Nothing in the kernel reads
//! them back when deciding the next state.

pub mod engine;
pub mod log;
pub mod rules;
pub mod state;

pub use engine::StateClassifier;
pub use log::{TransitionLog, TransitionSummary};
pub use state::{CognitiveState, SignalExtract, TransitionRecord};
