//! Prompt constants for the recommendation engine.

/// Ranking prompt. Replace `{assessments}` and `{query}` before sending.
/// The literal braces in the schema example survive the substitution because
/// only the two named placeholders are replaced.
pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"You are an expert consultant who specializes in recommending assessments for hiring managers.

Given the job description or query, analyze it to understand the skills, experience level, and requirements needed.
Then recommend the most appropriate assessments from the following options:

{assessments}

Based on the query: {query}

IMPORTANT: You must respond with a valid JSON object containing an array of recommendations.
The JSON must have this exact structure:
{
    "recommendations": [
        {
            "name": "Assessment Name",
            "url": "Assessment URL",
            "remote_testing": "Yes or No",
            "adaptive_support": "Yes or No",
            "duration": "Duration in minutes",
            "type": "Assessment Type",
            "explanation": "Brief explanation of why this assessment is recommended"
        },
        ... additional recommendations (max 10 total) ...
    ]
}

Consider time constraints mentioned in the query, technical skills required, and the role level.
Only recommend assessments from the options listed above; do not invent new ones.
Sort the assessments from most relevant to least relevant.
Limit the recommendations to a maximum of 10, minimum of 1.
Your response MUST be a valid, parseable JSON object exactly as specified above."#;

pub fn build_recommend_prompt(assessments: &str, query: &str) -> String {
    RECOMMEND_PROMPT_TEMPLATE
        .replace("{assessments}", assessments)
        .replace("{query}", query)
}
