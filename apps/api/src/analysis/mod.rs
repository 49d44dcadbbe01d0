// Resume analysis pipeline.
// Intake validates and bounds each upload; the client talks to the model
// through llm_client and owns the parse/fallback policy.

pub mod client;
pub mod fallback;
pub mod handlers;
pub mod intake;
pub mod prompts;
