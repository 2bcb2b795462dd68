// Prompt templates for the resume assessment call.

pub const ASSESSMENT_SYSTEM_PREFIX: &str = "\
You are a copilot assisting a hiring manager reviewing resumes. \
Assess the candidate strictly against the job description below. \
You MUST respond with valid JSON only — no markdown fences, no explanations — \
with exactly these fields: \
\"base_requirement_score\" (integer 0-100, how well the candidate meets the \
base requirements), \
\"commentary\" (string, what may make this candidate exceptional or stand out), \
\"fitness_score\" (integer 0-100, overall fitness for the role).";

/// Builds the system prompt for one assessment call.
pub fn assessment_system(role_description: &str) -> String {
    format!("{ASSESSMENT_SYSTEM_PREFIX}\n\nJOB DESCRIPTION:\n{role_description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_role_description() {
        let prompt = assessment_system("needs 5 years Go");
        assert!(prompt.contains("needs 5 years Go"));
        assert!(prompt.contains("fitness_score"));
    }
}
