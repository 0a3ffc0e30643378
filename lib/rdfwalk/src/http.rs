//! Blocking HTTP client shared by the ontology loader and the SPARQL protocol client.

use oxhttp::model::header::{ACCEPT, CONTENT_TYPE};
use oxhttp::model::{Body, Method, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout of a full HTTP exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default number of redirections followed before giving up.
pub const DEFAULT_REDIRECTION_LIMIT: usize = 10;

/// An error raised by an HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The server answered with a non-success status.
    #[error("Error {status} returned by {url} with payload:\n{payload}")]
    Status {
        status: u16,
        url: String,
        payload: String,
    },
    /// The server did not tell what it returned.
    #[error("No Content-Type returned by {0}")]
    MissingContentType(String),
}

/// A thin wrapper around [`oxhttp::Client`] with the user agent, timeout and redirection policy set.
#[derive(Clone)]
pub struct Client {
    client: Arc<oxhttp::Client>,
}

impl Client {
    pub fn new(timeout: Option<Duration>, redirection_limit: usize) -> Result<Self, HttpError> {
        let mut client = oxhttp::Client::new()
            .with_redirection_limit(redirection_limit)
            .with_user_agent(concat!("rdfwalk/", env!("CARGO_PKG_VERSION")))
            .map_err(invalid_input_error)?;
        if let Some(timeout) = timeout {
            client = client.with_global_timeout(timeout);
        }
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Sends a GET request and returns the response content type and body.
    pub fn get(&self, url: &str, accept: &str) -> Result<(String, Body), HttpError> {
        debug!(url, accept, "GET");
        let request = Request::builder()
            .uri(url)
            .header(ACCEPT, accept)
            .body(())
            .map_err(invalid_input_error)?;
        let response = self.client.request(request)?;
        read_response(url, response)
    }

    /// Sends a POST request with the given payload and returns the response content type and body.
    ///
    /// Responses without a body (e.g. `204 No Content` to a SPARQL update) get an empty content type.
    pub fn post(
        &self,
        url: &str,
        payload: Vec<u8>,
        content_type: &str,
        accept: &str,
    ) -> Result<(String, Body), HttpError> {
        debug!(url, content_type, accept, size = payload.len(), "POST");
        let request = Request::builder()
            .method(Method::POST)
            .uri(url)
            .header(ACCEPT, accept)
            .header(CONTENT_TYPE, content_type)
            .body(payload)
            .map_err(invalid_input_error)?;
        let response = self.client.request(request)?;
        let status = response.status();
        if status.is_success() && !response.headers().contains_key(CONTENT_TYPE) {
            return Ok((String::new(), response.into_body()));
        }
        read_response(url, response)
    }
}

fn read_response(url: &str, response: Response<Body>) -> Result<(String, Body), HttpError> {
    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            status: status.as_u16(),
            url: url.into(),
            payload: response.into_body().to_string()?,
        });
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .ok_or_else(|| HttpError::MissingContentType(url.into()))?
        .to_str()
        .map_err(invalid_data_error)?
        .to_owned();
    debug!(
        url,
        status = status.as_u16(),
        content_type = content_type.as_str(),
        "response"
    );
    Ok((content_type, response.into_body()))
}

fn invalid_data_error(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

fn invalid_input_error(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, error)
}
