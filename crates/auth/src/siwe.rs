use chrono::{DateTime, Utc};

use crate::error::{AuthError, Result};

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// An EIP-4361 sign-in message. Parsing is lenient: absent fields are
/// `None`, but a field that is present must be well formed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiweMessage {
    pub scheme: Option<String>,
    pub domain: Option<String>,
    pub address: Option<String>,
    pub statement: Option<String>,
    pub uri: Option<String>,
    pub version: Option<String>,
    pub chain_id: Option<u64>,
    pub nonce: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

fn timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| AuthError::InvalidMessage(format!("{field} is not an RFC 3339 timestamp")))
}

impl SiweMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let mut message = SiweMessage::default();
        let mut lines = text.lines().peekable();

        if let Some(header) = lines.peek().and_then(|line| line.strip_suffix(HEADER_SUFFIX)) {
            match header.split_once("://") {
                Some((scheme, domain)) => {
                    message.scheme = Some(scheme.to_string());
                    message.domain = Some(domain.to_string());
                }
                None => message.domain = Some(header.to_string()),
            }
            lines.next();
            message.address = lines
                .next()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string);
        }

        let mut statement = Vec::new();
        let mut in_resources = false;
        for line in lines {
            if in_resources {
                if let Some(resource) = line.strip_prefix("- ") {
                    message.resources.push(resource.to_string());
                    continue;
                }
                in_resources = false;
            }

            let Some((key, value)) = line.split_once(": ").or_else(|| {
                (line == "Resources:").then_some(("Resources", ""))
            }) else {
                if !line.trim().is_empty() && message.uri.is_none() {
                    statement.push(line);
                }
                continue;
            };

            match key {
                "URI" => message.uri = Some(value.to_string()),
                "Version" => message.version = Some(value.to_string()),
                "Chain ID" => {
                    let chain_id = value.parse().map_err(|_| {
                        AuthError::InvalidMessage("Chain ID is not a number".into())
                    })?;
                    message.chain_id = Some(chain_id);
                }
                "Nonce" => message.nonce = Some(value.to_string()),
                "Issued At" => message.issued_at = Some(timestamp(key, value)?),
                "Expiration Time" => message.expiration_time = Some(timestamp(key, value)?),
                "Not Before" => message.not_before = Some(timestamp(key, value)?),
                "Request ID" => message.request_id = Some(value.to_string()),
                "Resources" => in_resources = true,
                _ if message.uri.is_none() => statement.push(line),
                _ => {}
            }
        }

        if !statement.is_empty() {
            message.statement = Some(statement.join("\n"));
        }
        Ok(message)
    }

    /// False once `expiration_time` has passed or before `not_before`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let not_expired = self.expiration_time.map_or(true, |exp| now < exp);
        let started = self.not_before.map_or(true, |nbf| now >= nbf);
        not_expired && started
    }
}
