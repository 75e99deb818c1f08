//! Wire types for the optimization stream and the requests that drive it.

use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeData;

// ────────────────────────────────────────────────────────────────────────────
// Suggestions
// ────────────────────────────────────────────────────────────────────────────

/// Ordinal impact of a suggestion. Values outside the known set are kept as
/// `Unspecified` rather than failing the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// A single proposed change to the résumé.
///
/// `accepted` is client-local: whatever the server sends is discarded when the
/// suggestion is installed into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub section: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub original: String,
    pub suggested: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub accepted: bool,
}

impl Suggestion {
    /// True when both suggestions describe the same change: same section,
    /// operation, original text and suggested text. Reason, impact and the
    /// acceptance flag do not take part.
    pub fn same_change(&self, other: &Suggestion) -> bool {
        self.section == other.section
            && self.kind == other.kind
            && self.original == other.original
            && self.suggested == other.suggested
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Score and interview payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatchScore {
    #[serde(default)]
    pub matched: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub percentage: u32,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub name: String,
    pub present: bool,
    pub score: u32,
}

/// ATS compatibility score computed by the backend. Replaced wholesale on
/// every record that carries one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    pub overall_score: u32,
    #[serde(default)]
    pub keyword_match: KeywordMatchScore,
    #[serde(default)]
    pub section_completeness: u32,
    #[serde(default)]
    pub sections: Vec<SectionScore>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub category: String,
    pub question: String,
    #[serde(default)]
    pub tips: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Progress record
// ────────────────────────────────────────────────────────────────────────────

/// One decoded event from the optimization stream.
///
/// An empty `suggestions` list means "no change this tick", never "clear".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub step: String,
    pub progress: u32,
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ats_score: Option<AtsScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_questions: Option<Vec<InterviewQuestion>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Body of the backend's streaming optimize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub resume_id: String,
    pub job_id: String,
}

/// Body of the backend's save call.
#[derive(Debug, Serialize)]
pub struct SaveOptimizationRequest<'a> {
    pub resume_id: &'a str,
    pub optimized_data: &'a ResumeData,
}

/// What a front end posts to start a session: the base document it is
/// displaying and the analysed job to optimize against.
#[derive(Debug, Clone, Deserialize)]
pub struct StartOptimizationRequest {
    pub resume: ResumeData,
    pub job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(suggested: &str) -> Suggestion {
        Suggestion {
            section: "skills".to_string(),
            kind: "add_keyword".to_string(),
            original: "Current skills".to_string(),
            suggested: suggested.to_string(),
            reason: "Job requires it".to_string(),
            impact: Impact::High,
            accepted: false,
        }
    }

    #[test]
    fn test_record_defaults_optional_fields() {
        let json = r#"{"step":"analyzing","progress":10,"message":"Analyzing..."}"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert!(record.suggestions.is_empty());
        assert!(!record.completed);
        assert!(record.ats_score.is_none());
        assert!(record.interview_questions.is_none());
    }

    #[test]
    fn test_suggestion_type_field_maps_to_kind() {
        let json = r#"{
            "section": "experience",
            "type": "enhance_description",
            "original": "Built APIs",
            "suggested": "Built 12 REST APIs serving 2M requests/day",
            "reason": "Quantify impact",
            "impact": "medium"
        }"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.kind, "enhance_description");
        assert_eq!(s.impact, Impact::Medium);
        assert!(!s.accepted);
    }

    #[test]
    fn test_unknown_impact_is_unspecified() {
        let json = r#"{"section":"skills","type":"add_keyword","original":"","suggested":"Go","impact":"critical"}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.impact, Impact::Unspecified);
    }

    #[test]
    fn test_impact_ordering_high_first() {
        assert!(Impact::High < Impact::Medium);
        assert!(Impact::Medium < Impact::Low);
    }

    #[test]
    fn test_same_change_ignores_reason_impact_and_flag() {
        let a = suggestion("Docker");
        let mut b = suggestion("Docker");
        b.reason = "Different wording".to_string();
        b.impact = Impact::Low;
        b.accepted = true;
        assert!(a.same_change(&b));
        assert!(!a.same_change(&suggestion("Kubernetes")));
    }

    #[test]
    fn test_ats_score_tolerates_partial_payload() {
        let json = r#"{"overall_score": 72, "keyword_match": {"matched": 3, "total": 5}}"#;
        let score: AtsScore = serde_json::from_str(json).unwrap();
        assert_eq!(score.overall_score, 72);
        assert_eq!(score.keyword_match.matched, 3);
        assert!(score.sections.is_empty());
    }
}
