// Prompts for the upload flow: resume analysis and template recommendation.

/// Resume analysis prompt. Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT: &str = r#"Analyze the following resume and score it on Skills, Experience, and Education.

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": {"score": 0, "summary": "..."},
  "experience": {"score": 0, "summary": "..."},
  "education": {"score": 0, "summary": "..."},
  "overall": 0,
  "strengths": ["..."],
  "improvements": ["..."]
}

Scores are integers from 0 to 10. "overall" is an integer from 0 to 100.

RESUME:
{resume_text}"#;

/// System prompt for the template recommendation.
pub const RECOMMENDATION_SYSTEM: &str = "You are a career coach who helps candidates pick \
    the resume template that best presents their background for a specific job. \
    Be concise and concrete. Refer to templates by their number.";

/// Recommendation prompt. Placeholders: `{jd}`, `{resume}`, `{template_1}`,
/// `{template_2}`, `{template_3}`, `{rules}`.
pub const RECOMMENDATION_PROMPT: &str = r#"A candidate is applying for the job below. Choose the candidate template that best fits the job and the candidate's resume, explain why in a few sentences, and list the changes the candidate should make when moving their content into it.

{rules}

JOB DESCRIPTION:
{jd}

CANDIDATE RESUME:
{resume}

TEMPLATE 1:
{template_1}

TEMPLATE 2:
{template_2}

TEMPLATE 3:
{template_3}"#;
