//! Connection factory for remote servers.
//!
//! # Responsibilities
//! - Resolve a server's endpoint (scheme, host, port) from its URL
//! - Build an HTTP client with TLS trust options and bounded timeouts
//! - Attach authentication per security mode (CAS ticket or basic credentials)
//! - Re-issue requests that fail with allow-listed transient errors
//!
//! # Design Decisions
//! - A malformed URL is a configuration error: reported at once, never retried
//! - HTTP status errors are returned to the caller, never retried
//! - Timeouts are always finite so a hung server cannot stall a poll cycle

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use thiserror::Error;
use url::Url;

use crate::config::schema::{MonitorConfig, SecurityMode, ServerConfig, TlsConfig};
use crate::net::cas::CasAuthenticator;
use crate::net::tls;
use crate::resilience::retries::{error_chain, retry_transient, FailureKind, RetryPolicy};

/// Sub-path of the CAS endpoint relative to the server's base URL.
pub const CAS_PATH: &str = "/cas";

/// Errors raised while building or using a server connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// URL could not be parsed or lacks a host. Configuration problem.
    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    /// HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(String),

    /// Transport failed after all permitted attempts.
    #[error("{message}")]
    Transport {
        kind: Option<FailureKind>,
        attempts: u32,
        message: String,
    },

    /// Server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// CAS ticket could not be obtained.
    #[error("ticket acquisition failed: {0}")]
    Ticket(String),
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Scheme, host and port of a remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    /// Parse from a server URL, falling back to the scheme's default port.
    pub fn parse(url: &str) -> ConnectionResult<Self> {
        let parsed = Url::parse(url).map_err(|_| ConnectionError::InvalidUrl(url.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ConnectionError::InvalidUrl(url.to_string()))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ConnectionError::InvalidUrl(url.to_string()))?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host,
            port,
        })
    }

    /// Host suitable for a socket connect (IPv6 brackets stripped).
    pub fn connect_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    /// `scheme://host[:port]`, with the port omitted when it is the scheme default.
    pub fn base_url(&self) -> ConnectionResult<Url> {
        let default_port = if self.is_secure() { 443 } else { 80 };
        let text = if self.port == default_port {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        };
        Url::parse(&text).map_err(|_| ConnectionError::InvalidUrl(text))
    }

    /// Location of the CAS endpoint for this server.
    pub fn cas_url(&self) -> ConnectionResult<Url> {
        let mut url = self.base_url()?;
        url.set_path(CAS_PATH);
        Ok(url)
    }

    fn matches(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.as_str()) && url.port_or_known_default() == Some(self.port)
    }
}

/// Builds authenticated clients for configured servers.
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    retry: RetryPolicy,
    tls: TlsConfig,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl ConnectionFactory {
    pub fn new(retry: RetryPolicy, tls: TlsConfig, connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            retry,
            tls,
            connect_timeout,
            request_timeout,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            RetryPolicy::from_config(&config.retries),
            config.tls.clone(),
            Duration::from_secs(config.probe.connect_timeout_secs),
            Duration::from_secs(config.probe.request_timeout_secs),
        )
    }

    /// Build a client for requests against `context_url` on `server`.
    pub fn build_client(&self, server: &ServerConfig, context_url: &str) -> ConnectionResult<ServerClient> {
        let endpoint = ServerEndpoint::parse(&server.url)?;
        let context_url =
            Url::parse(context_url).map_err(|_| ConnectionError::InvalidUrl(context_url.to_string()))?;

        let builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout);
        let http = tls::configure(builder, &self.tls)
            .build()
            .map_err(|e| ConnectionError::Client(e.to_string()))?;

        let auth = match server.security_mode {
            SecurityMode::Cas => {
                let cas_url = endpoint.cas_url()?;
                tracing::debug!(server = %server.name, cas = %cas_url, "Using CAS authentication");
                Auth::Cas(CasAuthenticator::new(cas_url, server.username.clone(), server.password.clone()))
            }
            SecurityMode::Default => Auth::Basic {
                endpoint,
                username: server.username.clone(),
                password: server.password.clone(),
            },
        };

        Ok(ServerClient {
            http,
            retry: self.retry.clone(),
            context_url,
            auth,
        })
    }
}

#[derive(Debug)]
enum Auth {
    Cas(CasAuthenticator),
    Basic {
        endpoint: ServerEndpoint,
        username: String,
        password: Option<String>,
    },
}

/// HTTP client bound to one server and one service context.
#[derive(Debug)]
pub struct ServerClient {
    http: Client,
    retry: RetryPolicy,
    context_url: Url,
    auth: Auth,
}

impl ServerClient {
    pub fn context_url(&self) -> &Url {
        &self.context_url
    }

    pub fn security_mode(&self) -> SecurityMode {
        match self.auth {
            Auth::Cas(_) => SecurityMode::Cas,
            Auth::Basic { .. } => SecurityMode::Default,
        }
    }

    /// Authenticated GET of `url`; non-success statuses become `ConnectionError::Status`.
    pub async fn get(&self, url: Url) -> ConnectionResult<Response> {
        let response = match &self.auth {
            Auth::Cas(cas) => {
                let ticket = cas.service_ticket(&self.http, &self.retry, &self.context_url).await?;
                let mut target = url;
                target.query_pairs_mut().append_pair("ticket", &ticket);
                send_retrying(&self.retry, || self.http.get(target.clone())).await?
            }
            Auth::Basic {
                endpoint,
                username,
                password,
            } => {
                let with_credentials = endpoint.matches(&url);
                send_retrying(&self.retry, || {
                    let request = self.http.get(url.clone());
                    if with_credentials {
                        request.basic_auth(username, password.as_deref())
                    } else {
                        request
                    }
                })
                .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

/// Send a request built by `make`, retrying per `policy`.
pub(crate) async fn send_retrying<F>(policy: &RetryPolicy, mut make: F) -> ConnectionResult<Response>
where
    F: FnMut() -> RequestBuilder,
{
    retry_transient(policy, || make().send())
        .await
        .map_err(|exhausted| {
            if exhausted.error.is_builder() {
                return ConnectionError::InvalidUrl(exhausted.error.to_string());
            }
            ConnectionError::Transport {
                kind: exhausted.kind,
                attempts: exhausted.attempts,
                message: error_chain(&exhausted.error),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProbeStrategy;

    fn server(url: &str, mode: SecurityMode) -> ServerConfig {
        ServerConfig {
            name: "hub".to_string(),
            url: url.to_string(),
            username: "alice".to_string(),
            password: Some("pw".to_string()),
            security_mode: mode,
            check: ProbeStrategy::Metadata,
        }
    }

    fn factory() -> ConnectionFactory {
        ConnectionFactory::new(
            RetryPolicy::default(),
            TlsConfig::default(),
            Duration::from_secs(15),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_endpoint_default_ports() {
        let e = ServerEndpoint::parse("https://hub.example.com/ctx").unwrap();
        assert_eq!(e.port, 443);
        let e = ServerEndpoint::parse("http://hub.example.com").unwrap();
        assert_eq!(e.port, 80);
        let e = ServerEndpoint::parse("http://hub.example.com:8080").unwrap();
        assert_eq!(e.port, 8080);
        let e = ServerEndpoint::parse("http://[::1]:9000").unwrap();
        assert_eq!(e.connect_host(), "::1");
    }

    #[test]
    fn test_cas_url_omits_default_port() {
        let e = ServerEndpoint::parse("https://hub.example.com:443/app").unwrap();
        assert_eq!(e.cas_url().unwrap().as_str(), "https://hub.example.com/cas");

        let e = ServerEndpoint::parse("http://hub.example.com:80").unwrap();
        assert_eq!(e.cas_url().unwrap().as_str(), "http://hub.example.com/cas");

        let e = ServerEndpoint::parse("https://hub.example.com:8443").unwrap();
        assert_eq!(e.cas_url().unwrap().as_str(), "https://hub.example.com:8443/cas");
    }

    #[test]
    fn test_malformed_url_is_configuration_error() {
        let err = factory()
            .build_client(&server("::not a url::", SecurityMode::Default), "https://hub.example.com")
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidUrl(_)));

        let err = factory()
            .build_client(&server("https://hub.example.com", SecurityMode::Default), "relative/path")
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidUrl(_)));
    }

    #[test]
    fn test_security_mode_selects_auth() {
        let client = factory()
            .build_client(&server("https://hub.example.com", SecurityMode::Cas), "https://hub.example.com/api")
            .unwrap();
        assert_eq!(client.security_mode(), SecurityMode::Cas);

        let client = factory()
            .build_client(&server("https://hub.example.com", SecurityMode::Default), "https://hub.example.com/api")
            .unwrap();
        assert_eq!(client.security_mode(), SecurityMode::Default);
        assert_eq!(client.context_url().as_str(), "https://hub.example.com/api");
    }

    #[test]
    fn test_credentials_scoped_to_configured_host() {
        let e = ServerEndpoint::parse("http://hub.example.com:8080").unwrap();
        assert!(e.matches(&Url::parse("http://hub.example.com:8080/x").unwrap()));
        assert!(!e.matches(&Url::parse("http://hub.example.com/x").unwrap()));
        assert!(!e.matches(&Url::parse("http://other.example.com:8080/x").unwrap()));
    }
}
