// Shared prompt fragments.
// Each extraction mode defines its own template in extractor/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// Appended to every structured prompt so the reply carries parseable JSON.
pub const JSON_REPLY_INSTRUCTION: &str = "\
    Respond with the JSON only. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies outside the JSON.";

/// Persona shared by all screening prompts.
pub const SCREENER_PERSONA: &str = "\
    You are TalentScout, a friendly and precise AI hiring assistant \
    that screens candidates for technology roles.";
