use std::fmt::{Display, Formatter, Result as FmtResult};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::constants::ANONYMOUS_USERNAMES;

/// Rate-limit partition key: the authenticated username, or the remote
/// address when the client logged in anonymously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Resolve the identity of a logged-in client.
    pub fn for_login(username: Option<&str>, remote_addr: IpAddr) -> Self {
        match username.map(str::trim) {
            Some(name) if !name.is_empty() && !is_anonymous(name) => Self(name.to_string()),
            _ => Self(remote_addr.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether a login name denotes an anonymous session.
pub fn is_anonymous(username: &str) -> bool {
    ANONYMOUS_USERNAMES
        .iter()
        .any(|anon| anon.eq_ignore_ascii_case(username))
}

impl Display for ClientIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
