/// Outbound email layer
///
/// Defines the provider-neutral `Email` message and the `EmailSender` seam the
/// HTTP handlers talk to. The SparkPost implementation lives in `sparkpost`.

pub mod sparkpost;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub use sparkpost::{SparkPostEmailSender, SparkPostSettings};

/// A single outbound email, built per request and never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Errors raised while building or sending an email
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("the From attribute has to be populated to send an email")]
    MissingFrom,
    #[error("invalid email provider settings: {0}")]
    Settings(String),
    #[error("email provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("email provider answered {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Anything able to deliver an `Email`
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), EmailError>;
}

/// Whether a body should be delivered as HTML rather than plain text
///
/// A body is HTML when its first non-whitespace character is `<`.
pub fn is_html_body(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_html() {
        assert!(is_html_body("<p>hello</p>"));
        assert!(is_html_body("  \n\t<html><body>x</body></html>"));
    }

    #[test]
    fn prose_is_text() {
        assert!(!is_html_body("hello <b>there</b>"));
        assert!(!is_html_body("   plain"));
        assert!(!is_html_body(""));
    }
}
