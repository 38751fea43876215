use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// One conversation entry. Immutable once appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            code_context: None,
        }
    }

    pub fn with_context(
        role: Role,
        content: impl Into<String>,
        code_context: Option<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            code_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_lowercase() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(
            serde_json::to_string(&Role::System).unwrap(),
            "\"system\""
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = "tool".parse::<Role>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_message_serializes_camel_case_context() {
        let msg = Message::with_context(Role::User, "hi", Some("fn main() {}".to_string()));
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"codeContext\""));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code_context.as_deref(), Some("fn main() {}"));
    }

    #[test]
    fn test_context_field_optional_on_decode() {
        let json = r#"{"role":"user","content":"hi","timestamp":"2024-05-01T00:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.code_context.is_none());
    }
}
