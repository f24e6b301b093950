//! CAS ticket acquisition.
//!
//! # Protocol
//! ```text
//! POST {cas}/v1/tickets   username, password   → 201 Location: {tgt}
//! POST {tgt}              service={context}    → 200 body: ST-...
//! GET  {target}?ticket=ST-...
//! ```
//!
//! The ticket-granting ticket is cached and re-requested once when the CAS
//! server no longer recognises it.

use reqwest::{header, Client, StatusCode};
use tokio::sync::Mutex;
use url::Url;

use crate::net::connection::{send_retrying, ConnectionError, ConnectionResult};
use crate::resilience::RetryPolicy;

/// Acquires service tickets from one CAS server.
#[derive(Debug)]
pub struct CasAuthenticator {
    cas_url: Url,
    username: String,
    password: Option<String>,
    granting_ticket: Mutex<Option<Url>>,
}

impl CasAuthenticator {
    pub fn new(cas_url: Url, username: String, password: Option<String>) -> Self {
        Self {
            cas_url,
            username,
            password,
            granting_ticket: Mutex::new(None),
        }
    }

    /// Obtain a one-time service ticket for `service`.
    pub async fn service_ticket(&self, http: &Client, retry: &RetryPolicy, service: &Url) -> ConnectionResult<String> {
        let mut cached = self.granting_ticket.lock().await;

        let tgt = match cached.as_ref() {
            Some(tgt) => tgt.clone(),
            None => self.grant(http, retry).await?,
        };

        let ticket = match self.request_service_ticket(http, retry, &tgt, service).await {
            Err(ConnectionError::Status(status)) if is_stale(status) => {
                tracing::debug!(cas = %self.cas_url, "Ticket-granting ticket expired, requesting a new one");
                let fresh = self.grant(http, retry).await?;
                let ticket = self.request_service_ticket(http, retry, &fresh, service).await?;
                *cached = Some(fresh);
                return Ok(ticket);
            }
            other => other?,
        };

        *cached = Some(tgt);
        Ok(ticket)
    }

    async fn grant(&self, http: &Client, retry: &RetryPolicy) -> ConnectionResult<Url> {
        let endpoint = self.tickets_endpoint()?;
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.as_deref().unwrap_or_default()),
        ];

        let response = send_retrying(retry, || http.post(endpoint.clone()).form(&form)).await?;
        if response.status() != StatusCode::CREATED {
            return Err(ConnectionError::Ticket(format!(
                "CAS server refused credentials for '{}' ({})",
                self.username,
                response.status()
            )));
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ConnectionError::Ticket("CAS response lacks a ticket location".to_string()))?;

        endpoint
            .join(location)
            .map_err(|e| ConnectionError::Ticket(format!("invalid ticket location '{}': {}", location, e)))
    }

    async fn request_service_ticket(
        &self,
        http: &Client,
        retry: &RetryPolicy,
        tgt: &Url,
        service: &Url,
    ) -> ConnectionResult<String> {
        let form = [("service", service.as_str())];
        let response = send_retrying(retry, || http.post(tgt.clone()).form(&form)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConnectionError::Ticket(format!("failed to read service ticket: {}", e)))?;
        let ticket = body.trim();
        if ticket.is_empty() {
            return Err(ConnectionError::Ticket("CAS returned an empty service ticket".to_string()));
        }
        Ok(ticket.to_string())
    }

    fn tickets_endpoint(&self) -> ConnectionResult<Url> {
        let mut endpoint = self.cas_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| ConnectionError::InvalidUrl(self.cas_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "tickets"]);
        Ok(endpoint)
    }
}

fn is_stale(status: u16) -> bool {
    status == 400 || status == 404
}
