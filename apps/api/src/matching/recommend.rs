use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::prompts::{CANDIDATES_ONLY_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;
use crate::matching::prompts::{
    RECOMMENDATION_PROMPT, RECOMMENDATION_SYSTEM, RESUME_ANALYSIS_PROMPT,
};
use crate::retrieval::models::Match;

/// Number of template slots in the recommendation prompt.
pub const TEMPLATE_SLOTS: usize = 3;

/// Scores a resume on skills, experience and education. Returns the model's
/// JSON as-is.
pub async fn analyze_resume(resume_text: &str, llm: &LlmClient) -> Result<Value, AppError> {
    let prompt = RESUME_ANALYSIS_PROMPT.replace("{resume_text}", resume_text);
    llm.call_json::<Value>(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Resume analysis failed: {e}")))
}

/// Asks the model which of the retrieved templates suits the job best.
pub async fn recommend_template(
    jd_text: &str,
    resume_text: &str,
    matches: &[Match],
    llm: &LlmClient,
) -> Result<String, AppError> {
    let prompt = format_recommendation_prompt(jd_text, resume_text, matches);
    llm.call_text(&prompt, RECOMMENDATION_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Template recommendation failed: {e}")))
}

/// Fills the recommendation prompt. Unused template slots are left empty;
/// a placeholder match contributes its "no match" preview.
pub fn format_recommendation_prompt(jd_text: &str, resume_text: &str, matches: &[Match]) -> String {
    let mut prompt = RECOMMENDATION_PROMPT
        .replace("{rules}", CANDIDATES_ONLY_INSTRUCTION)
        .replace("{jd}", jd_text)
        .replace("{resume}", resume_text);
    for slot in 0..TEMPLATE_SLOTS {
        let preview = matches
            .get(slot)
            .map(|m| format!("{}\n{}", m.title, m.template_preview_text))
            .unwrap_or_default();
        prompt = prompt.replace(&format!("{{template_{}}}", slot + 1), &preview);
    }
    prompt
}
