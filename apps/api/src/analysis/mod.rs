// Resume analysis: load documents, fan out scoring calls, join the results.
// All LLM calls go through llm_client via the `Scorer` seam.

pub mod engine;
pub mod handlers;
pub mod ingest;
pub mod prompts;
pub mod scorer;
