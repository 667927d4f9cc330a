// All LLM prompt text for resume scoring.
// Reuses the JSON-only fragment from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// System prompt for scoring a resume against a job description.
pub fn scoring_system() -> String {
    format!(
        "You are an experienced technical recruiter who evaluates how well a resume \
        fits a job description. {JSON_ONLY_SYSTEM}"
    )
}

/// Builds the user prompt for one resume.
/// Inputs are interpolated in one pass so neither can inject into the other.
pub fn build_scoring_prompt(job_description: &str, resume_text: &str) -> String {
    format!(
        r#"Evaluate the resume below against the job description.

JOB DESCRIPTION:
"""
{job_description}
"""

RESUME:
"""
{resume_text}
"""

Estimate how closely the candidate matches the role as an integer percentage from 0 to 100,
then list what the resume does well, what could be improved, and which skills the job asks
for that the resume does not show.

Return a JSON object with this EXACT schema:
{{
  "matchPercentage": 75,
  "insights": {{
    "strengths": ["..."],
    "improvements": ["..."],
    "missingSkills": ["..."]
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_inputs() {
        let prompt = build_scoring_prompt("Senior Rust Engineer", "Jane Doe, 6 years of Rust");
        assert!(prompt.contains("Senior Rust Engineer"));
        assert!(prompt.contains("Jane Doe, 6 years of Rust"));
        assert!(prompt.contains("\"matchPercentage\""));
        assert!(prompt.contains("\"missingSkills\""));
    }

    #[test]
    fn test_prompt_keeps_placeholder_like_text_verbatim() {
        let prompt = build_scoring_prompt("{resume_text}", "{job_description}");
        assert!(prompt.contains("\"\"\"\n{resume_text}\n\"\"\""));
        assert!(prompt.contains("\"\"\"\n{job_description}\n\"\"\""));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(scoring_system().contains("valid JSON only"));
    }
}
