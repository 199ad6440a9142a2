// Evaluation prompt templates and the instruction payload built from them.
// The date line anchors relative-time judgments ("present", "last year") in the resume.

use chrono::NaiveDate;

pub const EVALUATION_SYSTEM: &str = "Current date: {current_date}

You are an expert ATS (Applicant Tracking System) evaluator. Analyze resumes and provide comprehensive structured feedback in JSON format.";

pub const EVALUATION_PROMPT: &str = r#"Analyze this resume and provide a comprehensive evaluation.

Evaluate the resume on these 5 sections:
1. Grammar & Writing Quality (0-100): Evaluate grammar, spelling, sentence structure, and professional tone
2. Formatting & Structure (0-100): Assess layout, visual hierarchy, section organization, and readability
3. Keyword Alignment (0-100): Check for industry-relevant keywords and ATS-friendly terminology
4. Experience Relevance (0-100): Evaluate how well work experience is presented and quantified
5. Skills Relevance (0-100): Assess technical and soft skills presentation and relevance

Return your response in JSON format with this exact structure:
{
  "score": <overall_score_0_to_100>,
  "sections": {
    "grammarWriting": {"score": <score>, "feedback": "<detailed feedback>"},
    "formatting": {"score": <score>, "feedback": "<detailed feedback>"},
    "keywordAlignment": {"score": <score>, "feedback": "<detailed feedback>"},
    "experienceRelevance": {"score": <score>, "feedback": "<detailed feedback>"},
    "skillsRelevance": {"score": <score>, "feedback": "<detailed feedback>"}
  }
}

Resume:
{resume_text}"#;

/// Backend-neutral "what to ask the model". Each transport adapts it to its
/// own request shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPayload {
    pub system: String,
    pub user: String,
}

impl InstructionPayload {
    /// Single prompt for generate-style backends that take no message list.
    pub fn composed(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Renders the fixed evaluation instructions around the document text.
pub fn build(document_text: &str, as_of: NaiveDate) -> InstructionPayload {
    let current_date = format_prompt_date(as_of);
    InstructionPayload {
        system: EVALUATION_SYSTEM.replace("{current_date}", &current_date),
        user: EVALUATION_PROMPT.replace("{resume_text}", document_text),
    }
}

/// `dd/mm/yy`
fn format_prompt_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}
