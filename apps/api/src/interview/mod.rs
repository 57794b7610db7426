// Interview question pipeline: tag the résumé, build the round prompt, call the
// model with bounded retries, parse the reply and track the session.
// All model calls go through llm_client::CompletionService.

pub mod evaluator;
pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod store;
pub mod tagger;
