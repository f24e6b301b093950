//! Reachability check.
//!
//! # Responsibilities
//! - Open a raw TCP connection to the server's host and port
//! - Bound the attempt with the connect timeout (15s by default)
//! - Report Ok when the socket connects, Error otherwise
//!
//! # Design Decisions
//! - No application protocol is spoken; a completed connect is the whole check
//! - Port falls back to the URL scheme's default when the URL has none

use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::schema::ServerConfig;
use crate::health::state::ServerState;
use crate::net::ServerEndpoint;
use crate::resilience::timeouts::with_deadline;

/// Default connect timeout for reachability checks.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    connect_timeout: Duration,
}

impl Default for ReachabilityProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl ReachabilityProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub async fn check(&self, server: &ServerConfig) -> ServerState {
        match self.connect(server).await {
            Ok(true) => ServerState::ok(&server.username),
            Ok(false) => ServerState::error(&server.username, None),
            Err(e) => {
                tracing::warn!(
                    server = %server.name,
                    url = %server.url,
                    error = %e,
                    "Server is down"
                );
                ServerState::error(&server.username, Some(e.to_string()))
            }
        }
    }

    async fn connect(&self, server: &ServerConfig) -> io::Result<bool> {
        let endpoint = ServerEndpoint::parse(&server.url)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let stream = with_deadline(
            self.connect_timeout,
            "connect",
            TcpStream::connect((endpoint.connect_host(), endpoint.port)),
        )
        .await?;

        Ok(stream.peer_addr().is_ok())
    }
}
