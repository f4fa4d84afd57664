// Upload flow: resume + job description in, analysis, template matches and a
// recommendation out. Also serves stored resumes and templates for download.

pub mod handlers;
pub mod prompts;
pub mod recommend;
