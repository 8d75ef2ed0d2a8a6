use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("malformed URI sequence: {0}")]
    MalformedUri(String),
    #[error("dom error: {0}")]
    Dom(String),
    #[error("timer error: {0}")]
    Timer(String),
    #[error("invalid page location {href}: {reason}")]
    InvalidLocation { href: String, reason: String },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("pattern error: {0}")]
    Pattern(String),
    #[error("element not found: #{0}")]
    ElementNotFound(String),
    #[error("assertion failed for #{id}: expected {expected}, actual {actual}, snippet {dom_snippet}")]
    AssertionFailed {
        id: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}
