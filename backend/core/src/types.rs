use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::destination::Destination;

/// Principal a sink writes as, e.g. `serviceAccount:service-123@gcp-sa-logging.iam.gserviceaccount.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriterIdentity(String);

impl WriterIdentity {
    /// Build a writer identity from the provider's value.
    ///
    /// A bare e-mail is treated as a service account. Returns `None` for an
    /// empty value.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return None;
        }
        if raw.contains(':') {
            Some(Self(raw.to_string()))
        } else {
            Some(Self(format!("serviceAccount:{raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WriterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One role and the principals granted it on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: String,
    pub members: Vec<String>,
}

impl RoleBinding {
    pub fn new<I, S>(role: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_member(&self, principal: &str) -> bool {
        self.members.iter().any(|m| m == principal)
    }
}

/// Collapse bindings that share a role into one, so each role appears once.
///
/// Roles keep the order they were first seen in; members are unioned in
/// first-seen order with duplicates dropped.
pub fn normalize_bindings(raw: impl IntoIterator<Item = RoleBinding>) -> Vec<RoleBinding> {
    let mut out: Vec<RoleBinding> = Vec::new();
    for binding in raw {
        let slot = match out.iter().position(|b| b.role == binding.role) {
            Some(idx) => &mut out[idx],
            None => {
                out.push(RoleBinding {
                    role: binding.role,
                    members: Vec::new(),
                });
                let last = out.len() - 1;
                &mut out[last]
            }
        };
        for member in binding.members {
            if !slot.members.contains(&member) {
                slot.members.push(member);
            }
        }
    }
    out
}

/// A role bound to the writer identity that is not the baseline role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub role: String,
    pub members: Vec<String>,
    pub expected_role: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role: {}, Members: {:?}", self.role, self.members)?;
        write!(f, "\nExpected Role: {}", self.expected_role)
    }
}

/// The writer identity and destination a sink is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSink {
    pub writer_identity: WriterIdentity,
    pub destination: Destination,
    /// Destination exactly as the sink reported it.
    pub destination_uri: String,
}

/// Everything one audit run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub sink: String,
    pub project: String,
    pub writer_identity: WriterIdentity,
    pub destination: Destination,
    pub destination_uri: String,
    pub required_role: String,
    pub bindings: Vec<RoleBinding>,
    pub findings: Vec<Finding>,
    pub audited_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
