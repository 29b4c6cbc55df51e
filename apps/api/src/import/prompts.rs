// Text import LLM prompt templates.

pub const IMPORT_SYSTEM: &str = "\
You are a precise resume data extractor. \
You MUST respond with valid JSON only. No markdown fences, no explanations. \
Extract only what the text states. Do NOT invent employers, dates, metrics or skills. \
If a section has nothing new in the text, return an empty array for it.";

pub const IMPORT_PROMPT: &str = r#"Extract resume content from the text below. The candidate's current resume is
included so you can skip entries it already contains.

CURRENT RESUME:
{current_resume}

INPUT TEXT:
{raw_text}

OUTPUT SCHEMA (return exactly this structure; omit optional keys you cannot fill):
{
  "professional_summary": "string" | null,
  "work_experience": [{"company": "string", "position": "string", "location": "string", "date": "string", "description": ["string"], "technologies": ["string"]}],
  "education": [{"school": "string", "degree": "string", "field": "string", "location": "string", "date": "string", "gpa": "string", "achievements": ["string"]}],
  "skills": [{"category": "string", "items": ["string"]}],
  "projects": [{"name": "string", "description": ["string"], "date": "string", "technologies": ["string"], "url": "string", "github_url": "string"}],
  "certifications": [{"name": "string", "issuer": "string", "date_acquired": "string", "expiry_date": "string", "credential_id": "string", "url": "string"}]
}

Only set "professional_summary" when the text contains a summary or objective statement."#;

/// Fills both placeholders in one pass over the template. Inserted text is
/// never scanned again, so braces inside the résumé or the input stay literal.
pub fn build_import_prompt(current_resume: &str, raw_text: &str) -> String {
    let mut out = String::with_capacity(IMPORT_PROMPT.len() + current_resume.len() + raw_text.len());
    let mut rest = IMPORT_PROMPT;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{current_resume}") {
            out.push_str(current_resume);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{raw_text}") {
            out.push_str(raw_text);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_import_prompt_fills_placeholders() {
        let prompt = build_import_prompt("{\"first_name\":\"Ada\"}", "Worked at Acme 2020-2023");
        assert!(prompt.contains("\"first_name\":\"Ada\""));
        assert!(prompt.contains("Worked at Acme 2020-2023"));
        assert!(!prompt.contains("{raw_text}"));
        assert!(!prompt.contains("{current_resume}"));
    }

    #[test]
    fn test_placeholder_text_in_inputs_is_not_substituted() {
        let resume = r#"{"professional_summary":"Templating nerd: {raw_text}"}"#;
        let text = "Built a {current_resume} renderer at Acme";

        let prompt = build_import_prompt(resume, text);

        assert!(prompt.contains("Templating nerd: {raw_text}"));
        assert!(prompt.contains("Built a {current_resume} renderer at Acme"));
        assert_eq!(prompt.matches("Built a").count(), 1);
        assert_eq!(prompt.matches("Templating nerd").count(), 1);
        assert!(prompt.contains("\"skills\": [{\"category\""));
    }
}
