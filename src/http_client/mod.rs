use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::errors::NetworkError;

const USER_AGENT: &str = concat!("daily-notify/", env!("CARGO_PKG_VERSION"));

/// The client shared by every fetch and delivery of a run.
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

/// Sends the request, turning transport failures into [`NetworkError`].
///
/// Any HTTP status is returned as a response; callers decide what counts as
/// success. The URL is logged and reported without its query string.
pub async fn execute(req: RequestBuilder) -> anyhow::Result<Response> {
    send(req, redacted).await
}

/// Like [`execute`], for URLs that are credentials themselves (webhooks):
/// only the origin is ever logged or reported.
pub async fn execute_secret_url(req: RequestBuilder) -> anyhow::Result<Response> {
    send(req, origin).await
}

async fn send(req: RequestBuilder, display: fn(&Url) -> String) -> anyhow::Result<Response> {
    let (client, req) = req.build_split();
    let req = req
        .map_err(reqwest::Error::without_url)
        .context("failed to build request")?;
    let url = display(req.url());
    tracing::debug!("{} {url}", req.method());
    client.execute(req).await.map_err(|source| {
        NetworkError {
            url,
            source: source.without_url(),
        }
        .into()
    })
}

/// GETs `url` and returns the body, failing on non-success statuses.
pub async fn get_text(client: &Client, url: Url) -> anyhow::Result<String> {
    let display = redacted(&url);
    let resp = execute(client.get(url)).await?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("failed to read response body of {display}"))?;
    if !status.is_success() {
        anyhow::bail!("GET {display} returned {status}");
    }
    Ok(body)
}

/// Reads an error response body without letting the URL into the error.
pub async fn error_body(resp: Response) -> anyhow::Result<String> {
    resp.text()
        .await
        .map_err(reqwest::Error::without_url)
        .context("failed to read error response")
}

/// The URL without its query string, which may carry an API key.
pub fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Scheme, host and port only.
pub fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
