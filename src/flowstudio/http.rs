//! Shared `ureq` plumbing for the provider and template clients.

use crate::error::{Result, StudioError};
use std::time::Duration;
use ureq::Agent;
use ureq::http::Response;

/// Agent that reports HTTP error statuses as responses, not errors.
pub fn agent(timeout_secs: u64) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Read the body, turning a status >= 400 into [`StudioError::HttpStatus`].
pub fn read_body(response: Response<ureq::Body>) -> Result<String> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(StudioError::HttpStatus {
            status,
            body: error_body,
        });
    }

    Ok(body_reader.read_to_string()?)
}
