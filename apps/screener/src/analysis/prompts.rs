//! Analysis tasks selectable from the home form and their prompt templates.


/// Prompt for `analyze_resume`: a structured strengths/weaknesses review.
pub const ANALYZE_RESUME_PROMPT: &str = "\
Conduct a detailed analysis of the resume against the job description, highlighting strengths, weaknesses, and alignment with the role.
Respond in Markdown format:
- **Overview**
- **Strengths**
- **Weaknesses**
- **Final Verdict**";

/// Prompt for `percentage_match`: the model's own alignment estimate.
pub const PERCENTAGE_MATCH_PROMPT: &str = "\
Calculate the alignment percentage between the resume and the job description. Respond in Markdown:
- **Match Percentage**
- **Matched Keywords**
- **Missing Keywords**
- **Suggestions**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTask {
    AnalyzeResume,
    PercentageMatch,
}

impl AnalysisTask {
    pub const ALL: [AnalysisTask; 2] = [AnalysisTask::AnalyzeResume, AnalysisTask::PercentageMatch];

    /// Parses the `task` form value. Unknown values yield `None`.
    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisTask::AnalyzeResume => "analyze_resume",
            AnalysisTask::PercentageMatch => "percentage_match",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisTask::AnalyzeResume => "Analyze resume",
            AnalysisTask::PercentageMatch => "Percentage match",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            AnalysisTask::AnalyzeResume => ANALYZE_RESUME_PROMPT,
            AnalysisTask::PercentageMatch => PERCENTAGE_MATCH_PROMPT,
        }
    }

    /// Only the percentage task computes a keyword match; the rest report 0.
    pub fn computes_match(&self) -> bool {
        matches!(self, AnalysisTask::PercentageMatch)
    }
}
