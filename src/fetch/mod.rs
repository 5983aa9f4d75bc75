mod basic;
mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::debug;

use crate::error::FetchError;

/// Performs a GET against `url` and returns the body as text.
///
/// Transport failures and non-success statuses both surface as a
/// [`FetchError`]; there is no retry.
#[tracing::instrument(skip(client))]
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String, FetchError> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client
        .execute(req)
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let text = resp.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;
    debug!(bytes = text.len(), "Fetched CSV body");
    Ok(text)
}

/// Loads CSV text from a local file path or fetches it over HTTP.
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<String, FetchError> {
    if source.starts_with("http") {
        fetch_text(client, source).await
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|source_err| FetchError::Io {
                path: source.to_string(),
                source: source_err,
            })
    }
}
