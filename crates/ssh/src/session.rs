//! Per-call SSH/SFTP sessions
//!
//! One authenticated session per logical operation: connect, run the SFTP
//! subsystem, perform a single primitive, disconnect. Establishment
//! retries on connection- and authentication-level failures with a fixed
//! budget and delay; local failures such as an unreadable key file
//! propagate immediately.

use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh::keys::{load_secret_key, PrivateKeyWithHashAlg, PublicKey};
use russh::Disconnect;
use russh_sftp::client::SftpSession;

use fr_core::{retry_fixed, AuthMethod, Credentials, Error, Result, RetryPolicy};

/// Fixed retry budget for session establishment.
const CONNECT_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(2));

/// Classifier for session establishment: only connection- and
/// authentication-level failures are worth the budget.
pub fn is_transient_connect(error: &Error) -> bool {
    matches!(error, Error::Network(_) | Error::Auth(_))
}

/// Accepts the server key unverified; host trust is handled by the
/// credential configuration, not by this layer.
struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// A transient handle: connected, authenticated, SFTP subsystem running.
pub struct SshSession {
    handle: Handle<ClientHandler>,
    sftp: SftpSession,
}

impl SshSession {
    /// Establish a session with the connection retry budget applied.
    pub async fn open(creds: &Credentials) -> Result<Self> {
        retry_fixed(&CONNECT_RETRY, || Self::connect(creds), is_transient_connect).await
    }

    async fn connect(creds: &Credentials) -> Result<Self> {
        let config = Arc::new(client::Config::default());
        let addr = (creds.host.as_str(), creds.port);
        let mut handle = client::connect(config, addr, ClientHandler)
            .await
            .map_err(|e| Error::Network(format!("{}:{}: {e}", creds.host, creds.port)))?;

        let authenticated = match &creds.auth {
            AuthMethod::Password(password) => handle
                .authenticate_password(&creds.user, password)
                .await
                .map_err(|e| Error::Auth(e.to_string()))?
                .success(),
            AuthMethod::KeyFile(path) => {
                // A missing or malformed key file is a local problem and
                // must not burn connection retries.
                let key = load_secret_key(path, None)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
                let hash_alg = handle
                    .best_supported_rsa_hash()
                    .await
                    .ok()
                    .flatten()
                    .flatten();
                handle
                    .authenticate_publickey(
                        &creds.user,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(|e| Error::Auth(e.to_string()))?
                    .success()
            }
        };

        if !authenticated {
            return Err(Error::Auth(format!(
                "{}@{} rejected the configured credentials",
                creds.user, creds.host
            )));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        tracing::debug!(host = %creds.host, port = creds.port, user = %creds.user, "Session established");

        Ok(Self { handle, sftp })
    }

    pub fn sftp(&self) -> &SftpSession {
        &self.sftp
    }

    /// Tear the session down after its single primitive. Close failures
    /// cannot affect the already-determined outcome; they are only logged.
    pub async fn close(self) {
        if let Err(e) = self.sftp.close().await {
            tracing::debug!(error = %e, "SFTP channel close failed");
        }
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!(error = %e, "SSH disconnect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_classifier() {
        assert!(is_transient_connect(&Error::Network("refused".into())));
        assert!(is_transient_connect(&Error::Auth("rejected".into())));
        assert!(!is_transient_connect(&Error::Config("no key file".into())));
        assert!(!is_transient_connect(&Error::Io(std::io::Error::other("x"))));
        assert!(!is_transient_connect(&Error::NotFound("x".into())));
    }
}
