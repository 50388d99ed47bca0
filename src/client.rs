use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FetchError, ValidationError};
use crate::models::{Repository, UserProfile};
use crate::schema;

/// Base URL of the GitHub REST API.
pub const API_BASE: &str = "https://api.github.com";

/// Creates a preconfigured HTTP client with required headers.
pub fn build_client(token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "User-Agent",
        HeaderValue::from_static(concat!("github-user-search/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        "Accept",
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("invalid GITHUB_TOKEN value")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .default_headers(headers)
        .build()
        .context("failed to build HTTP client")
}

/// Fetches a GitHub user by username and validates the payload.
pub async fn fetch_user(
    client: &Client,
    base: &str,
    username: &str,
) -> Result<UserProfile, FetchError> {
    let payload = get_json(client, &format!("{base}/users/{username}")).await?;
    Ok(schema::parse_user(&payload)?)
}

/// Fetches a user's repositories and validates each element.
pub async fn fetch_repos(
    client: &Client,
    base: &str,
    username: &str,
) -> Result<Vec<Repository>, FetchError> {
    let payload = get_json(client, &format!("{base}/users/{username}/repos")).await?;
    Ok(schema::parse_repos(&payload)?)
}

/// Issues exactly one GET and returns the parsed JSON body.
async fn get_json(client: &Client, url: &str) -> Result<Value, FetchError> {
    debug!(%url, "GET");
    let response = client.get(url).send().await.map_err(FetchError::Network)?;

    let status = response.status();
    let body = response.text().await.map_err(FetchError::Network)?;

    if !status.is_success() {
        warn!(%url, %status, "request failed");
        return Err(FetchError::Http {
            status,
            message: upstream_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|_| {
        ValidationError::single("payload", "response body was not valid JSON").into()
    })
}

/// GitHub error bodies carry a human-readable `message` field; fall back
/// to the raw body when they don't.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}
