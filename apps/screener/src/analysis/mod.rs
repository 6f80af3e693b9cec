// Résumé analysis: PDF extraction, keyword scoring, task prompts and the
// upload, analyze and persist pipeline behind POST /home.
// All generation calls go through llm_client.

pub mod extractor;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod store;
