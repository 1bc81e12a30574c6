//! Pages fetched with HTTP GET

use super::{PageResult, Provider};
use crate::context::Context;
use jpage_format::{PageError, PageStream, Result};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::io::{self, Read};
use tracing::debug;

/// Provider treating page ids as URLs
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
}

/// Provider backed by a default blocking client
pub fn http_provider() -> Result<HttpProvider> {
    let client = Client::builder()
        .build()
        .map_err(|err| PageError::InvalidConfig(format!("cannot build HTTP client: {err}")))?;
    Ok(HttpProvider::with_client(client))
}

/// Provider backed by `client`
pub fn http_provider_with(client: Client) -> HttpProvider {
    HttpProvider::with_client(client)
}

impl HttpProvider {
    /// Use a preconfigured client (proxies, headers, TLS settings)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Provider for HttpProvider {
    fn open(&mut self, ctx: &Context, url: &str) -> PageResult {
        ctx.check()?;

        let mut request = self.client.get(url);
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }
        let response = request
            .send()
            .map_err(|err| PageError::fetch(url, err))?;

        let status = response.status();
        debug!(target: "jpage::provider", url, status = status.as_u16(), "fetched page");
        if status != StatusCode::OK {
            return Err(PageError::fetch(
                url,
                format!("wrong status code: {}", status.as_u16()),
            ));
        }
        Ok(Some(Box::new(ResponseBody(response))))
    }
}

struct ResponseBody(Response);

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

// dropping the response returns the connection
impl PageStream for ResponseBody {}
