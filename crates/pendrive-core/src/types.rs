use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

// ─── Verdict ──────────────────────────────────────────────────────

/// Whether the credential host may be used right now.
///
/// Strictly binary: there is no degraded state. Anything short of all three
/// host-reported conditions holding is `Unavailable`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    #[default]
    Unavailable,
    Available,
}

impl Verdict {
    pub fn is_available(self) -> bool {
        self == Self::Available
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        }
    }
}

impl From<bool> for Verdict {
    fn from(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Status report ────────────────────────────────────────────────

/// Payload of `GET /api/status`.
///
/// The host also reports fields such as `pendrive_path`; they carry no
/// meaning for the client and are ignored on decode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub server_running: bool,
    pub pendrive_detected: bool,
    /// Heartbeat from the desktop vault application.
    pub java_running: bool,
    #[serde(default)]
    pub passwords_count: u64,
}

impl StatusReport {
    pub fn verdict(&self) -> Verdict {
        Verdict::from(self.server_running && self.pendrive_detected && self.java_running)
    }

    /// Short description of the first missing condition, for logs and UI.
    pub fn missing_condition(&self) -> Option<&'static str> {
        if !self.server_running {
            Some("credential host not running")
        } else if !self.pendrive_detected {
            Some("pendrive not detected")
        } else if !self.java_running {
            Some("vault application not running")
        } else {
            None
        }
    }
}

// ─── Availability events ──────────────────────────────────────────

/// Edge notification shared between contexts over the broadcast bus.
///
/// Serializes to the `{"type": "CONNECTION_LOST"}` /
/// `{"type": "CONNECTION_RESTORED", "passwordsCount": n}` message shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AvailabilityEvent {
    #[serde(rename = "CONNECTION_LOST")]
    Lost,
    #[serde(rename = "CONNECTION_RESTORED")]
    Restored {
        #[serde(rename = "passwordsCount")]
        passwords_count: u64,
    },
}

impl AvailabilityEvent {
    /// The verdict a receiver should adopt on this event.
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Lost => Verdict::Unavailable,
            Self::Restored { .. } => Verdict::Available,
        }
    }
}

// ─── Credentials ──────────────────────────────────────────────────

/// A single saved login as served by the host.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Host name or free-form label.
    pub website: String,
    pub username: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl CredentialRecord {
    pub fn new(
        website: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            website: website.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Reject records with any blank field before they reach the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("website", &self.website),
            ("username", &self.username),
            ("password", &self.secret),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.website.trim(),
            self.username.trim(),
            self.secret.trim(),
        )
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Payload of `GET /api/passwords` and `GET /api/passwords/{domain}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialList {
    #[serde(default)]
    pub passwords: Vec<CredentialRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(server: bool, pendrive: bool, vault: bool) -> StatusReport {
        StatusReport {
            server_running: server,
            pendrive_detected: pendrive,
            java_running: vault,
            passwords_count: 2,
        }
    }

    #[test]
    fn verdict_requires_all_three_conditions() {
        assert_eq!(report(true, true, true).verdict(), Verdict::Available);
        assert_eq!(report(false, true, true).verdict(), Verdict::Unavailable);
        assert_eq!(report(true, false, true).verdict(), Verdict::Unavailable);
        assert_eq!(report(true, true, false).verdict(), Verdict::Unavailable);
    }

    #[test]
    fn missing_condition_names_first_gap() {
        assert_eq!(
            report(true, false, false).missing_condition(),
            Some("pendrive not detected")
        );
        assert_eq!(report(true, true, true).missing_condition(), None);
    }

    #[test]
    fn status_report_ignores_extra_fields() {
        let json = r#"{
            "server_running": true,
            "pendrive_detected": true,
            "java_running": false,
            "pendrive_path": "/media/usb0",
            "passwords_count": 7
        }"#;
        let parsed: StatusReport = serde_json::from_str(json).expect("valid status");
        assert_eq!(parsed.passwords_count, 7);
        assert_eq!(parsed.verdict(), Verdict::Unavailable);
    }

    #[test]
    fn broadcast_message_shapes() {
        let lost = serde_json::to_value(AvailabilityEvent::Lost).expect("serialize");
        assert_eq!(lost, serde_json::json!({"type": "CONNECTION_LOST"}));

        let restored = serde_json::to_value(AvailabilityEvent::Restored { passwords_count: 3 })
            .expect("serialize");
        assert_eq!(
            restored,
            serde_json::json!({"type": "CONNECTION_RESTORED", "passwordsCount": 3})
        );
    }

    #[test]
    fn credential_wire_field_is_password() {
        let json = r#"{"website":"example.com","username":"ann","password":"pw","id":0}"#;
        let record: CredentialRecord = serde_json::from_str(json).expect("valid record");
        assert_eq!(record.secret, "pw");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let record = CredentialRecord::new("example.com", "ann", "hunter2");
        let out = format!("{record:?}");
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let record = CredentialRecord::new("", "ann", "pw");
        assert_eq!(
            record.validate(),
            Err(ValidationError::MissingField("website"))
        );
        let record = CredentialRecord::new("example.com", "ann", "   ");
        assert_eq!(
            record.validate(),
            Err(ValidationError::MissingField("password"))
        );
        assert!(CredentialRecord::new("a", "b", "c").validate().is_ok());
    }
}
