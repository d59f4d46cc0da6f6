use crate::error::{PipelineError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// Fixed upload category.
const CATEGORY_ID: &str = "17";

#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: ClientSecret,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// OAuth-authenticated resumable uploads to the YouTube Data API v3.
/// Credentials live in `client_secret.json` (from the Google Cloud
/// Console) and `token.json` (written back after each authorization).
pub struct YoutubeUploader {
    client: Client,
    token_path: PathBuf,
    secret_path: PathBuf,
}

impl YoutubeUploader {
    pub fn new() -> Self {
        Self::with_paths(PathBuf::from("token.json"), PathBuf::from("client_secret.json"))
    }

    pub fn with_paths(token_path: PathBuf, secret_path: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(3600))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            token_path,
            secret_path,
        }
    }

    /// Upload a finished video as a private YouTube Short, returning the
    /// platform-assigned video id.
    pub fn upload(&self, video: &Path, meta: &UploadMetadata) -> Result<String> {
        info!("Preparing to upload to YouTube...");
        let access_token = self.obtain_access_token()?;
        let session_uri = self.initiate_session(&access_token, meta)?;
        let video_id = self.send_video(&session_uri, &access_token, video)?;
        info!(
            "Video uploaded to YouTube: https://www.youtube.com/watch?v={}",
            video_id
        );
        Ok(video_id)
    }

    /// Load-or-refresh-or-interactively-authorize, in that order.
    fn obtain_access_token(&self) -> Result<String> {
        let secret = self.load_client_secret()?;

        if let Some(stored) = self.load_stored_token() {
            if let Some(refresh) = stored.refresh_token.as_deref() {
                match self.refresh_access_token(&secret, refresh) {
                    Ok(token) => return Ok(token),
                    Err(e) => warn!("Token refresh failed, starting new authorization: {}", e),
                }
            }
        }

        self.interactive_authorize(&secret)
    }

    fn load_client_secret(&self) -> Result<ClientSecret> {
        if !self.secret_path.exists() {
            return Err(PipelineError::Auth(format!(
                "{} not found. Download it from Google Cloud Console first",
                self.secret_path.display()
            )));
        }
        let raw = fs::read_to_string(&self.secret_path)?;
        let parsed: ClientSecretFile = serde_json::from_str(&raw)?;
        Ok(parsed.installed)
    }

    fn load_stored_token(&self) -> Option<StoredToken> {
        let raw = fs::read_to_string(&self.token_path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", self.token_path.display(), e);
                None
            }
        }
    }

    fn store_token(&self, token: &StoredToken) -> Result<()> {
        fs::write(&self.token_path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    fn refresh_access_token(&self, secret: &ClientSecret, refresh_token: &str) -> Result<String> {
        info!("Refreshing YouTube access token...");
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(PipelineError::Auth(format!(
                "Token refresh failed: {}",
                response.text()?
            )));
        }

        let token: TokenResponse = response.json()?;
        self.store_token(&StoredToken {
            access_token: token.access_token.clone(),
            // Google omits the refresh token on refresh responses; keep the old one.
            refresh_token: Some(
                token
                    .refresh_token
                    .unwrap_or_else(|| refresh_token.to_string()),
            ),
        })?;
        Ok(token.access_token)
    }

    /// Installed-app loopback flow: print the consent URL, catch the
    /// browser redirect on an ephemeral localhost port, exchange the code.
    fn interactive_authorize(&self, secret: &ClientSecret) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").map_err(|e| {
            PipelineError::Auth(format!("Cannot bind loopback listener for OAuth: {}", e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| PipelineError::Auth(e.to_string()))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}", port);

        let mut auth_url =
            Url::parse(AUTH_ENDPOINT).map_err(|e| PipelineError::Auth(e.to_string()))?;
        auth_url
            .query_pairs_mut()
            .append_pair("client_id", &secret.client_id)
            .append_pair("redirect_uri", &redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", UPLOAD_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        println!("Open this URL in your browser to authorize the upload:\n{}", auth_url);
        info!("Waiting for OAuth redirect on {}", redirect_uri);

        let code = wait_for_code(&listener)?;

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(PipelineError::Auth(format!(
                "Authorization code exchange failed: {}",
                response.text()?
            )));
        }

        let token: TokenResponse = response.json()?;
        self.store_token(&StoredToken {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
        })?;
        Ok(token.access_token)
    }

    /// Open a resumable-upload session, returning the session URI.
    fn initiate_session(&self, access_token: &str, meta: &UploadMetadata) -> Result<String> {
        let body = json!({
            "snippet": {
                "title": meta.title,
                "description": meta.description,
                "tags": meta.tags,
                "categoryId": CATEGORY_ID,
            },
            "status": {
                "privacyStatus": "private",
                "selfDeclaredMadeForKids": false,
            }
        });

        let response = self
            .client
            .post(UPLOAD_ENDPOINT)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(PipelineError::Upload(format!(
                "Upload session request failed: {}",
                response.text()?
            )));
        }

        response
            .headers()
            .get("Location")
            .and_then(|value| value.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                PipelineError::Upload("No resumable session URI in response".to_string())
            })
    }

    fn send_video(&self, session_uri: &str, access_token: &str, video: &Path) -> Result<String> {
        info!("Uploading video to YouTube (this may take a while)...");
        let bytes = fs::read(video)?;

        let response = self
            .client
            .put(session_uri)
            .bearer_auth(access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()?;

        if !response.status().is_success() {
            return Err(PipelineError::Upload(format!(
                "Video upload failed: {}",
                response.text()?
            )));
        }

        #[derive(Deserialize)]
        struct UploadResponse {
            id: String,
        }
        let parsed: UploadResponse = response.json()?;
        Ok(parsed.id)
    }
}

impl Default for YoutubeUploader {
    fn default() -> Self {
        Self::new()
    }
}

/// Block until the OAuth redirect hits the listener and pull the `code`
/// query parameter out of the request line.
fn wait_for_code(listener: &TcpListener) -> Result<String> {
    let (stream, _) = listener
        .accept()
        .map_err(|e| PipelineError::Auth(format!("OAuth redirect never arrived: {}", e)))?;

    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&stream);
        reader.read_line(&mut request_line)?;
    }

    let request_path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| PipelineError::Auth("Malformed OAuth redirect request".to_string()))?;
    let redirect = Url::parse(&format!("http://127.0.0.1{}", request_path))
        .map_err(|e| PipelineError::Auth(format!("Malformed OAuth redirect: {}", e)))?;
    let code = redirect
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned());

    let body = "Authorization received. You can close this tab.";
    let _ = write!(
        &stream,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );

    code.ok_or_else(|| PipelineError::Auth("Authorization response carried no code".to_string()))
}
