/// Node configuration layer
///
/// Per-node email settings as stored by the orchestrator, the body substitution
/// applied to incoming payloads, the config store client and the settings page.

// Settings form rendering
pub mod page;

// HTTP client for the orchestrator's config store
pub mod store;

use crate::email::Email;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use page::render_config_page;
pub use store::{ConfigStore, StoreError};

pub const DEFAULT_EMAIL_ADDRESS: &str = "no-reply@proxeus.com";
pub const DEFAULT_EMAIL_SUBJECT: &str = "Subject";
pub const DEFAULT_EMAIL_BODY: &str =
    "Hey, this has been sent from the flow on workflow. CHF/XES: %s";
pub const DEFAULT_REPLACEMENT: &str = "CHFXES";

/// Email settings of one workflow node
///
/// Field names are PascalCase on the wire to match what the config store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email_from: String,
    /// One address, or several separated by commas
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email_to: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email_subject: String,
    /// Body template; `%s` marks where the replacement value goes
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email_body: String,
    /// Name of the payload field substituted into the body
    #[serde(default, deserialize_with = "null_as_empty")]
    pub replacement: String,
}

/// Stored configs may carry `null` for unset fields; those read as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rejected settings submission
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("empty fields")]
    EmptyFields,
}

impl NodeConfig {
    /// Settings used when the config store has nothing for a node
    pub fn defaults() -> Self {
        Self {
            email_from: DEFAULT_EMAIL_ADDRESS.to_string(),
            email_to: DEFAULT_EMAIL_ADDRESS.to_string(),
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            email_body: DEFAULT_EMAIL_BODY.to_string(),
            replacement: DEFAULT_REPLACEMENT.to_string(),
        }
    }

    /// Copy of `self` with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            email_from: self.email_from.trim().to_string(),
            email_to: self.email_to.trim().to_string(),
            email_subject: self.email_subject.trim().to_string(),
            email_body: self.email_body.trim().to_string(),
            replacement: self.replacement.trim().to_string(),
        }
    }

    /// Check the write-time invariant: sender, recipient, subject and body are set
    ///
    /// `Replacement` may stay empty, the body is then sent without substitution.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let required = [
            &self.email_from,
            &self.email_to,
            &self.email_subject,
            &self.email_body,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyFields);
        }
        Ok(())
    }

    /// Recipient list parsed from `EmailTo`
    pub fn recipients(&self) -> Vec<String> {
        self.email_to
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Build the email for a workflow payload
    pub fn compose(&self, payload: &Value) -> Email {
        let value = if self.replacement.is_empty() {
            None
        } else {
            payload.get(&self.replacement)
        };

        Email {
            from: self.email_from.clone(),
            to: self.recipients(),
            subject: self.email_subject.clone(),
            body: render_body(&self.email_body, value),
        }
    }
}

/// Substitute `value` into every `%s` / `%v` marker of `template`
///
/// Markers may carry Go-style flags, width and precision (`%-8s`, `%.3v`):
/// precision truncates the value, width pads it with spaces (on the right with
/// `-`). `%%` produces a literal percent sign; any other verb such as `%d` or
/// `%.2f` is kept as written. Strings are inserted without quotes, a missing or
/// null value becomes the empty string and other JSON values are inserted as
/// compact JSON.
pub fn render_body(template: &str, value: Option<&Value>) -> String {
    let replacement = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let chars: Vec<char> = template.chars().collect();
    let mut rendered = String::with_capacity(template.len() + replacement.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            rendered.push(chars[i]);
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'%') {
            rendered.push('%');
            i += 2;
            continue;
        }
        match Marker::parse(&chars[i + 1..]) {
            Some((marker, len)) => {
                rendered.push_str(&marker.apply(&replacement));
                i += 1 + len;
            }
            None => {
                rendered.push('%');
                i += 1;
            }
        }
    }
    rendered
}

/// Flags, width and precision of one `%s` / `%v` marker
#[derive(Debug, Default)]
struct Marker {
    left_align: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Marker {
    /// Parse the text following a `%`; returns the marker and how many chars it spans
    fn parse(rest: &[char]) -> Option<(Self, usize)> {
        let mut marker = Marker::default();
        let mut n = 0;
        while let Some(&c) = rest.get(n) {
            match c {
                '-' => marker.left_align = true,
                '+' | '#' | ' ' | '0' => {}
                _ => break,
            }
            n += 1;
        }
        marker.width = digits(rest, &mut n);
        if rest.get(n) == Some(&'.') {
            n += 1;
            marker.precision = Some(digits(rest, &mut n).unwrap_or(0));
        }
        match rest.get(n) {
            Some('s') | Some('v') => Some((marker, n + 1)),
            _ => None,
        }
    }

    fn apply(&self, value: &str) -> String {
        let mut text: String = match self.precision {
            Some(precision) => value.chars().take(precision).collect(),
            None => value.to_string(),
        };
        let len = text.chars().count();
        if let Some(width) = self.width.filter(|width| *width > len) {
            let padding = " ".repeat(width - len);
            text = if self.left_align {
                text + &padding
            } else {
                padding + &text
            };
        }
        text
    }
}

fn digits(rest: &[char], n: &mut usize) -> Option<usize> {
    let start = *n;
    while rest.get(*n).is_some_and(|c| c.is_ascii_digit()) {
        *n += 1;
    }
    if *n == start {
        return None;
    }
    rest[start..*n].iter().collect::<String>().parse().ok()
}
