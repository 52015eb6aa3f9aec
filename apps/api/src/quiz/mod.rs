// Timed quiz engine
// Implements: question sourcing, validation, fallback generation, the session
// state machine, per-question timers and result summaries.
// All LLM calls go through llm_client via the QuestionSource seam.

pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod results;
pub mod session;
pub mod source;
pub mod store;
pub mod timer;
pub mod validator;
