use serde::{Deserialize, Serialize};

/// Feedback carried by every section of the "unavailable" result.
pub const UNAVAILABLE_FEEDBACK: &str =
    "Could not analyze this section. Please try again or use a different AI model.";

/// Which backend family handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderVariant {
    /// Hosted inference (OpenRouter). Requires a credential.
    #[serde(rename = "openrouter")]
    Remote,
    /// Locally reachable inference (Ollama). No credential.
    #[serde(rename = "ollama")]
    Local,
}

impl ProviderVariant {
    /// Reads the `provider` form value. Only `"ollama"` selects the local
    /// backend; anything else, including absence, selects the hosted one.
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("ollama") => ProviderVariant::Local,
            _ => ProviderVariant::Remote,
        }
    }

    pub fn requires_credential(self) -> bool {
        matches!(self, ProviderVariant::Remote)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderVariant::Remote => "openrouter",
            ProviderVariant::Local => "ollama",
        }
    }
}

/// A single scored section. `score: None` means "could not be determined",
/// which is distinct from a numeric 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSection {
    pub score: Option<i64>,
    pub feedback: String,
}

impl ScoreSection {
    pub fn unavailable() -> Self {
        Self {
            score: None,
            feedback: UNAVAILABLE_FEEDBACK.to_string(),
        }
    }
}

/// The five named sections. Every key is always serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub grammar_writing: ScoreSection,
    pub formatting: ScoreSection,
    pub keyword_alignment: ScoreSection,
    pub experience_relevance: ScoreSection,
    pub skills_relevance: ScoreSection,
}

impl Sections {
    /// Wire names in serialization order.
    pub const KEYS: [&'static str; 5] = [
        "grammarWriting",
        "formatting",
        "keywordAlignment",
        "experienceRelevance",
        "skillsRelevance",
    ];

    pub fn unavailable() -> Self {
        Self {
            grammar_writing: ScoreSection::unavailable(),
            formatting: ScoreSection::unavailable(),
            keyword_alignment: ScoreSection::unavailable(),
            experience_relevance: ScoreSection::unavailable(),
            skills_relevance: ScoreSection::unavailable(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ScoreSection)> {
        Self::KEYS.into_iter().zip([
            &self.grammar_writing,
            &self.formatting,
            &self.keyword_alignment,
            &self.experience_relevance,
            &self.skills_relevance,
        ])
    }
}

/// Whether the model's answer could be used. Kept apart from the overall
/// score so that a genuine 0 is never mistaken for a failed analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed,
    Unavailable,
}

/// The score report returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub score: Option<i64>,
    pub sections: Sections,
    #[serde(skip)]
    pub outcome: AnalysisOutcome,
}

impl EvaluationResult {
    /// The sentinel result: null scores everywhere, fixed feedback.
    pub fn unavailable() -> Self {
        Self {
            score: None,
            sections: Sections::unavailable(),
            outcome: AnalysisOutcome::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.outcome == AnalysisOutcome::Analyzed
    }
}

/// An entry in the model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderModel {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub provider: ProviderVariant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_from_form_value() {
        assert_eq!(
            ProviderVariant::from_form_value(Some("ollama")),
            ProviderVariant::Local
        );
        assert_eq!(
            ProviderVariant::from_form_value(Some("openrouter")),
            ProviderVariant::Remote
        );
        assert_eq!(
            ProviderVariant::from_form_value(Some("something-else")),
            ProviderVariant::Remote
        );
        assert_eq!(ProviderVariant::from_form_value(None), ProviderVariant::Remote);
    }

    #[test]
    fn test_only_remote_requires_credential() {
        assert!(ProviderVariant::Remote.requires_credential());
        assert!(!ProviderVariant::Local.requires_credential());
    }

    #[test]
    fn test_unavailable_result_serializes_all_five_sections() {
        let value = serde_json::to_value(EvaluationResult::unavailable()).unwrap();
        assert_eq!(value["score"], json!(null));
        let sections = value["sections"].as_object().unwrap();
        assert_eq!(sections.len(), 5);
        for key in Sections::KEYS {
            assert_eq!(sections[key]["score"], json!(null));
            assert_eq!(sections[key]["feedback"], json!(UNAVAILABLE_FEEDBACK));
        }
    }

    #[test]
    fn test_outcome_is_not_serialized() {
        let value = serde_json::to_value(EvaluationResult::unavailable()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_provider_model_wire_shape() {
        let model = ProviderModel {
            id: "llama3:8b".to_string(),
            display_name: "llama3:8b".to_string(),
            provider: ProviderVariant::Local,
        };
        assert_eq!(
            serde_json::to_value(&model).unwrap(),
            json!({"id": "llama3:8b", "name": "llama3:8b", "provider": "ollama"})
        );
    }
}
