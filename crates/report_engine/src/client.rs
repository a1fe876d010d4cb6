use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};

use crate::{FailureKind, RemoteError, RemoteSettings};

/// Longest slice of an error body kept in a `RemoteError` message.
const MAX_ERROR_BODY: usize = 512;

/// One client per backend; requests share its connection pool.
pub(crate) fn build_client(settings: &RemoteSettings) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|err| RemoteError::new(FailureKind::Network, err.to_string()))
}

/// The hosted backend accepts the project key both as `apikey` and as a bearer token.
pub(crate) fn authorize(builder: RequestBuilder, api_key: &str) -> RequestBuilder {
    builder
        .header("apikey", api_key)
        .header(AUTHORIZATION, format!("Bearer {api_key}"))
}

pub(crate) async fn send(builder: RequestBuilder) -> Result<Response, RemoteError> {
    let response = builder.send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let mut message = body.trim().to_string();
    if message.is_empty() {
        message = status.to_string();
    } else if message.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|index| message.is_char_boundary(*index))
            .unwrap_or(0);
        message.truncate(cut);
    }
    Err(RemoteError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return RemoteError::new(FailureKind::Decode, err.to_string());
    }
    RemoteError::new(FailureKind::Network, err.to_string())
}

pub(crate) fn decode_error(err: serde_json::Error) -> RemoteError {
    RemoteError::new(FailureKind::Decode, err.to_string())
}
