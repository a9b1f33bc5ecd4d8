use std::net::IpAddr;

use async_trait::async_trait;
use libunftp::auth::{AuthenticationError, Authenticator, Credentials};

use intake_core::models::identity::is_anonymous;

use super::user::RelayUser;

/// Accepts anonymous logins with any password and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousAuthenticator;

impl AnonymousAuthenticator {
    fn login(&self, username: &str, source_ip: IpAddr) -> Result<RelayUser, AuthenticationError> {
        if !is_anonymous(username) {
            tracing::debug!(username = %username, source_ip = %source_ip, "Rejected non-anonymous login");
            return Err(AuthenticationError::BadUser);
        }

        tracing::debug!(username = %username, source_ip = %source_ip, "Anonymous login");
        Ok(RelayUser::new(username, source_ip))
    }
}

#[async_trait]
impl Authenticator<RelayUser> for AnonymousAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        creds: &Credentials,
    ) -> Result<RelayUser, AuthenticationError> {
        self.login(username, creds.source_ip)
    }
}
