//! TLS trust options for outbound clients.

use reqwest::ClientBuilder;

use crate::config::schema::TlsConfig;

/// Apply the configured trust mode to a client builder.
///
/// System roots are used unless `accept_unverified_peers` is set, in which case
/// certificate validation is switched off for every connection of this client.
pub fn configure(builder: ClientBuilder, tls: &TlsConfig) -> ClientBuilder {
    if tls.accept_unverified_peers {
        tracing::warn!("Certificate validation disabled for outbound connections");
        builder.danger_accept_invalid_certs(true)
    } else {
        builder
    }
}
