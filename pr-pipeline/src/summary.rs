use std::fmt;

/// Why a summary could not be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFailure {
    RateLimited,
    Timeout,
    /// Provider answered with an error status or the connection failed.
    ApiError,
    EmptyResponse,
    /// Provider answered 2xx with a body of the wrong shape.
    UnexpectedResponse,
    Other,
}

impl SummaryFailure {
    /// Fixed notice posted in place of a summary.
    pub fn sentinel(self) -> &'static str {
        match self {
            SummaryFailure::RateLimited => "[Error: Rate limit exceeded. Please try again later.]",
            SummaryFailure::Timeout => "[Error: Request timed out. Please try again.]",
            SummaryFailure::ApiError => "[Error: API error occurred.]",
            SummaryFailure::EmptyResponse => "[Error: Empty response from LLM.]",
            SummaryFailure::UnexpectedResponse => "[Error: Unexpected LLM response.]",
            SummaryFailure::Other => "[Error: Could not generate summary.]",
        }
    }
}

/// Outcome of the summarization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Generated(String),
    Failed(SummaryFailure),
}

impl Summary {
    /// Text to post and return: the summary itself or the failure notice.
    pub fn text(&self) -> &str {
        match self {
            Summary::Generated(s) => s,
            Summary::Failed(f) => f.sentinel(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Summary::Failed(_))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_summary_renders_sentinel() {
        let s = Summary::Failed(SummaryFailure::Timeout);
        assert!(s.is_failed());
        assert_eq!(s.text(), "[Error: Request timed out. Please try again.]");
        assert!(s.to_string().starts_with("[Error: "));
    }

    #[test]
    fn generated_summary_is_verbatim() {
        let s = Summary::Generated("Test summary".into());
        assert!(!s.is_failed());
        assert_eq!(s.text(), "Test summary");
    }
}
