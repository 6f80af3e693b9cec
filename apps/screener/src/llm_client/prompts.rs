// Cross-cutting prompt fragments for the generation service.
// Task-specific prompts live in analysis::prompts.

/// System instruction sent with every analysis request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
