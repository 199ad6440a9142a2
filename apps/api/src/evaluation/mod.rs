// Resume evaluation: credential checks, prompt building, response normalization
// and the orchestrator that ties them to a provider transport.
// All model calls go through llm_client; nothing here talks to a backend directly.

pub mod credentials;
pub mod handlers;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{Evaluator, Submission};
