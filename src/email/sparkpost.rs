/// SparkPost transmissions API client
///
/// Sends one transmission per email through `POST /api/v1/transmissions`.

use super::{is_html_body, Email, EmailError, EmailSender};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Url};
use serde::Serialize;
use std::time::Duration;

const TRANSMISSIONS_PATH: &str = "api/v1/transmissions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings needed to talk to SparkPost
#[derive(Debug, Clone)]
pub struct SparkPostSettings {
    pub api_key: String,
    pub base_url: String,
    /// Sender used when an email has none; may be empty
    pub default_from: String,
}

/// `EmailSender` backed by the SparkPost HTTP API
#[derive(Debug, Clone)]
pub struct SparkPostEmailSender {
    client: Client,
    endpoint: Url,
    api_key: String,
    default_from: String,
}

#[derive(Debug, Serialize)]
struct Transmission<'a> {
    recipients: Vec<Recipient<'a>>,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    address: Address<'a>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    from: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl SparkPostEmailSender {
    /// Validate the settings and build the HTTP client
    pub fn new(settings: SparkPostSettings) -> Result<Self, EmailError> {
        if settings.api_key.trim().is_empty() {
            return Err(EmailError::Settings("API key is empty".to_string()));
        }

        let base = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|e| EmailError::Settings(format!("base url '{}': {}", settings.base_url, e)))?;
        let endpoint = Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), TRANSMISSIONS_PATH))
            .map_err(|e| EmailError::Settings(format!("transmissions url: {}", e)))?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
            default_from: settings.default_from,
        })
    }

    fn transmission<'a>(&'a self, email: &'a Email) -> Result<Transmission<'a>, EmailError> {
        let from = if email.from.is_empty() {
            self.default_from.as_str()
        } else {
            email.from.as_str()
        };
        if from.is_empty() {
            return Err(EmailError::MissingFrom);
        }

        let (html, text) = if is_html_body(&email.body) {
            (Some(email.body.as_str()), None)
        } else {
            (None, Some(email.body.as_str()))
        };

        Ok(Transmission {
            recipients: email
                .to
                .iter()
                .map(|to| Recipient {
                    address: Address { email: to },
                })
                .collect(),
            content: Content {
                from,
                subject: &email.subject,
                html,
                text,
            },
        })
    }
}

#[async_trait]
impl EmailSender for SparkPostEmailSender {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let transmission = self.transmission(email)?;

        tracing::debug!(
            "📨 Sending transmission to {} recipient(s) via {}",
            transmission.recipients.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.api_key)
            .json(&transmission)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sender(base_url: &str, default_from: &str) -> SparkPostEmailSender {
        SparkPostEmailSender::new(SparkPostSettings {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            default_from: default_from.to_string(),
        })
        .unwrap()
    }

    fn email(from: &str, body: &str) -> Email {
        Email {
            from: from.to_string(),
            to: vec!["ops@example.com".to_string()],
            subject: "Rates".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn plain_body_is_sent_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transmissions"))
            .and(header("Authorization", "test-key"))
            .and(body_json(json!({
                "recipients": [{"address": {"email": "ops@example.com"}}],
                "content": {"from": "flows@example.com", "subject": "Rates", "text": "CHF/XES: 1.5"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": {"id": "1"}})))
            .expect(1)
            .mount(&server)
            .await;

        sender(&server.uri(), "")
            .send(&email("flows@example.com", "CHF/XES: 1.5"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn markup_body_is_sent_as_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transmissions"))
            .and(body_json(json!({
                "recipients": [{"address": {"email": "ops@example.com"}}],
                "content": {"from": "flows@example.com", "subject": "Rates", "html": "\n  <p>1.5</p>"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sender(&server.uri(), "")
            .send(&email("flows@example.com", "\n  <p>1.5</p>"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn default_sender_fills_missing_from() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transmissions"))
            .and(body_json(json!({
                "recipients": [{"address": {"email": "ops@example.com"}}],
                "content": {"from": "default@example.com", "subject": "Rates", "text": "hi"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sender(&server.uri(), "default@example.com")
            .send(&email("", "hi"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_from_without_default_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = sender(&server.uri(), "").send(&email("", "hi")).await.unwrap_err();
        assert!(matches!(err, EmailError::MissingFrom));
    }

    #[tokio::test]
    async fn provider_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transmissions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized."))
            .mount(&server)
            .await;

        let err = sender(&server.uri(), "")
            .send(&email("flows@example.com", "hi"))
            .await
            .unwrap_err();
        match err {
            EmailError::Api { status, body } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "Unauthorized.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = SparkPostEmailSender::new(SparkPostSettings {
            api_key: " ".to_string(),
            base_url: "https://api.sparkpost.com".to_string(),
            default_from: String::new(),
        });
        assert!(matches!(result, Err(EmailError::Settings(_))));
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let result = SparkPostEmailSender::new(SparkPostSettings {
            api_key: "key".to_string(),
            base_url: "not a url".to_string(),
            default_from: String::new(),
        });
        assert!(matches!(result, Err(EmailError::Settings(_))));
    }
}
