// Cross-cutting prompt fragments. Each feature keeps its own prompts.rs next
// to the code that sends them.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps template recommendations anchored to what retrieval returned.
pub const CANDIDATES_ONLY_INSTRUCTION: &str = "\
    CRITICAL: Only recommend templates from the numbered candidates provided. \
    Do NOT invent templates, filenames, or download links. \
    If a candidate slot is empty, ignore it. \
    If no candidate fits, say so plainly and explain what the candidate library is missing.";
