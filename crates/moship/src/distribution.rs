//! Distribution service client.
//!
//! The hosted distribution service speaks a strict three-call protocol, each
//! call's result gating the next:
//!
//! 1. `GET /api/get_upload_url` - returns a single-use upload target as a
//!    bare URL string
//! 2. `PUT <that URL>` - raw artifact bytes with an explicit length header
//! 3. `GET /api/get_current_version/` - JSON body whose `url` field is the
//!    install link handed to end users
//!
//! No retries are performed here - each call either succeeds or the whole
//! upload fails. The client is synchronous and sequential.
//!
//! The install-URL response has been observed to occasionally arrive as
//! malformed JSON with a well-formed embedded URL, so parsing is two-tier:
//! structured JSON first, then a regex extraction of the `"url"` field from
//! the raw text. Keep the fallback; it papers over a real upstream quirk.

use std::path::Path;
use std::time::Instant;

use moship_sdk::{Platform, ReleaseError};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;

use crate::config::{AppIdentity, DistributionCredentials};

const DEFAULT_BASE_URL: &str = "https://api.mobiledrop.dev";
const USER_AGENT: &str = "moship/0.1";

/// Format a file size in human-readable form (MB or KB).
fn format_file_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{} MB", bytes / 1_000_000)
    } else if bytes >= 1_000 {
        format!("{} KB", bytes / 1_000)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Result of a completed three-call protocol exchange.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadResult {
    /// Service-issued link from which the uploaded build can be installed.
    pub install_url: String,
}

/// Client for the hosted distribution service.
#[derive(Debug, Clone)]
pub struct DistributionClient {
    http: Client,
    creds: DistributionCredentials,
    base_url: String,
}

impl DistributionClient {
    pub fn new(
        creds: DistributionCredentials,
        endpoint: Option<&str>,
    ) -> Result<Self, ReleaseError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ReleaseError::Protocol(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            creds,
            base_url: endpoint.unwrap_or(DEFAULT_BASE_URL).to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Executes the full three-call exchange for one artifact.
    pub fn upload(
        &self,
        platform: Platform,
        identity: &AppIdentity,
        artifact: &Path,
    ) -> Result<UploadResult, ReleaseError> {
        let upload_url = self.get_upload_url(platform, identity)?;
        self.put_artifact(&upload_url, artifact)?;
        let install_url = self.get_install_url(platform)?;
        Ok(UploadResult { install_url })
    }

    /// Call 1: obtain a single-use upload target.
    ///
    /// The response body is a bare URL string; anything that does not start
    /// with the secure-scheme prefix is a protocol error.
    pub fn get_upload_url(
        &self,
        platform: Platform,
        identity: &AppIdentity,
    ) -> Result<String, ReleaseError> {
        let resp = self
            .http
            .get(self.api("api/get_upload_url"))
            .query(&[
                ("user_id", self.creds.user_id.as_str()),
                ("app_id", self.creds.app_id.as_str()),
                ("key", self.creds.key.as_str()),
                ("platform", platform.as_str()),
                ("version", identity.version_name.as_str()),
                ("bundle_id", identity.bundle_id.as_str()),
            ])
            .send()
            .map_err(|e| ReleaseError::Protocol(format!("requesting upload URL: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ReleaseError::Protocol(format!("reading upload URL response: {}", e)))?;
        if !status.is_success() {
            return Err(ReleaseError::Protocol(format!(
                "get_upload_url failed (status {}): {}",
                status, text
            )));
        }

        validate_upload_url(&text)
    }

    /// Call 2: stream the artifact's full byte content to the upload target.
    pub fn put_artifact(&self, upload_url: &str, artifact: &Path) -> Result<(), ReleaseError> {
        let bytes = std::fs::read(artifact)?;
        println!(
            "Uploading {} ({})...",
            artifact
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("artifact"),
            format_file_size(bytes.len() as u64)
        );
        let start = Instant::now();

        let len = bytes.len();
        let resp = self
            .http
            .put(upload_url)
            .header(CONTENT_LENGTH, len)
            .body(bytes)
            .send()
            .map_err(|e| ReleaseError::Upload(format!("transferring artifact: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ReleaseError::Upload(format!(
                "status {}: {}",
                status, body
            )));
        }

        println!("  Uploaded (took {}s)", start.elapsed().as_secs());
        Ok(())
    }

    /// Call 3: query current-version metadata and extract the install URL.
    pub fn get_install_url(&self, platform: Platform) -> Result<String, ReleaseError> {
        let resp = self
            .http
            .get(self.api("api/get_current_version/"))
            .query(&[
                ("user_id", self.creds.user_id.as_str()),
                ("app_id", self.creds.app_id.as_str()),
                ("key", self.creds.key.as_str()),
                ("platform", platform.as_str()),
            ])
            .send()
            .map_err(|e| ReleaseError::Protocol(format!("requesting install URL: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ReleaseError::Protocol(format!("reading install URL response: {}", e)))?;
        if !status.is_success() {
            return Err(ReleaseError::Protocol(format!(
                "get_current_version failed (status {}): {}",
                status, text
            )));
        }

        extract_install_url(&text).ok_or_else(|| {
            ReleaseError::Protocol(format!(
                "no install URL in current-version response: {}",
                text
            ))
        })
    }
}

fn validate_upload_url(body: &str) -> Result<String, ReleaseError> {
    let url = body.trim();
    if !url.starts_with("https://") {
        return Err(ReleaseError::Protocol(format!(
            "upload URL response is not a secure URL: {}",
            body
        )));
    }
    Ok(url.to_string())
}

/// Extracts the `url` field from a current-version response body.
///
/// Structured JSON first; if that fails, fall back to pulling the quoted
/// `"url"` value out of the raw text.
fn extract_install_url(text: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(url) = value.get("url").and_then(|v| v.as_str()) {
            return Some(url.to_string());
        }
    }

    let re = Regex::new(r#""url"\s*:\s*"([^"]+)""#).ok()?;
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> DistributionCredentials {
        DistributionCredentials {
            user_id: "u-1".into(),
            app_id: "a-2".into(),
            key: "k-3".into(),
        }
    }

    #[test]
    fn new_client_uses_default_base_url() {
        let client = DistributionClient::new(creds(), None).unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn endpoint_override_replaces_base_url() {
        let client =
            DistributionClient::new(creds(), Some("https://staging.example.com/")).unwrap();
        assert_eq!(client.api("api/get_upload_url"), "https://staging.example.com/api/get_upload_url");
    }

    #[test]
    fn api_constructs_url_correctly() {
        let client = DistributionClient::new(creds(), None)
            .unwrap()
            .with_base_url("https://test.example.com");
        assert_eq!(
            client.api("/api/get_current_version/"),
            "https://test.example.com/api/get_current_version/"
        );
    }

    #[test]
    fn upload_url_must_use_secure_scheme() {
        assert_eq!(
            validate_upload_url("  https://u.example.com/slot/1\n").unwrap(),
            "https://u.example.com/slot/1"
        );
        assert!(validate_upload_url("http://u.example.com/slot/1").is_err());
        assert!(validate_upload_url("<html>502 Bad Gateway</html>").is_err());
        assert!(validate_upload_url("").is_err());
    }

    #[test]
    fn install_url_parses_well_formed_json() {
        let body = r#"{"version": "1.2.3", "url": "https://d.example.com/install/42"}"#;
        assert_eq!(
            extract_install_url(body).unwrap(),
            "https://d.example.com/install/42"
        );
    }

    #[test]
    fn install_url_falls_back_to_regex_on_malformed_json() {
        // Truncated JSON with a well-formed embedded URL, as the service has
        // been observed to return.
        let body = r#"{"version": "1.2.3", "url": "https://d.example.com/install/42", "#;
        assert_eq!(
            extract_install_url(body).unwrap(),
            "https://d.example.com/install/42"
        );
    }

    #[test]
    fn install_url_fallback_tolerates_loose_spacing() {
        let body = r#"garbage "url" : "https://d.example.com/x" garbage"#;
        assert_eq!(
            extract_install_url(body).unwrap(),
            "https://d.example.com/x"
        );
    }

    #[test]
    fn install_url_absent_is_none() {
        assert!(extract_install_url(r#"{"version": "1.2.3"}"#).is_none());
        assert!(extract_install_url("plain text").is_none());
    }

    #[test]
    fn put_artifact_requires_readable_file() {
        let client = DistributionClient::new(creds(), None).unwrap();
        let err = client
            .put_artifact("https://u.example.com/slot", Path::new("/tmp/moship-missing.aab"))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Io(_)));
    }

    #[test]
    fn format_file_size_units() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2_048), "2 KB");
        assert_eq!(format_file_size(34_500_000), "34 MB");
    }
}
