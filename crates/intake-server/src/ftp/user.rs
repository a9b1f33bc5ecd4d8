use std::fmt::{Display, Formatter, Result as FmtResult};
use std::net::IpAddr;

use libunftp::auth::UserDetail;

use intake_core::ClientIdentity;

/// A logged-in FTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayUser {
    username: String,
    source_ip: IpAddr,
}

impl RelayUser {
    pub fn new(username: impl Into<String>, source_ip: IpAddr) -> Self {
        Self {
            username: username.into(),
            source_ip,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }

    /// Rate-limit key for this user's uploads.
    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity::for_login(Some(&self.username), self.source_ip)
    }
}

impl Display for RelayUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}@{}", self.username, self.source_ip)
    }
}

impl UserDetail for RelayUser {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_anonymous_user_is_keyed_by_address() {
        let user = RelayUser::new("anonymous", IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
        assert_eq!(user.identity().as_str(), "192.0.2.10");
        assert_eq!(user.to_string(), "anonymous@192.0.2.10");
    }

    #[test]
    fn test_named_user_is_keyed_by_name() {
        let user = RelayUser::new("scanner-01", IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(user.identity().as_str(), "scanner-01");
    }
}
