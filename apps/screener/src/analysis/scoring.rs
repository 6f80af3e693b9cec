use std::collections::HashSet;

/// Share of distinct job-description tokens that also appear in the résumé, 0–100.
///
/// Tokens are whitespace-separated and compared verbatim (case and punctuation
/// included). An empty job description scores 0.
pub fn match_percentage(job_description: &str, resume_text: &str) -> f64 {
    let job_tokens: HashSet<&str> = job_description.split_whitespace().collect();
    if job_tokens.is_empty() {
        return 0.0;
    }
    let resume_tokens: HashSet<&str> = resume_text.split_whitespace().collect();
    let matched = job_tokens.intersection(&resume_tokens).count();
    matched as f64 / job_tokens.len() as f64 * 100.0
}
