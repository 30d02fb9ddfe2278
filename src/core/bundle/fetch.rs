use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{Error, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("cardbundle-generator/", env!("CARGO_PKG_VERSION"));

/// Fetch a published sheet as CSV text.
///
/// `http(s)://` goes over the network; `file://` URLs and bare paths are read
/// from disk. Invalid UTF-8 is replaced rather than rejected.
pub fn fetch_csv_text(url: &str) -> Result<String> {
    let bytes = if url.starts_with("http://") || url.starts_with("https://") {
        fetch_http(url)?
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read(Path::new(path)).map_err(|e| Error::source_fetch_failed(url, e.to_string()))?
    };

    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

fn fetch_http(url: &str) -> Result<Vec<u8>> {
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::source_fetch_failed(url, e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::source_fetch_failed(url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::source_fetch_failed(
            url,
            format!("HTTP {}", status.as_u16()),
        ));
    }

    let body = response
        .bytes()
        .map_err(|e| Error::source_fetch_failed(url, e.to_string()))?;
    Ok(body.to_vec())
}
