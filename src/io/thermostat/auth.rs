use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::NestConfig;

pub const AUTH_URL: &str = "https://api.home.nest.com/oauth2/access_token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Cannot access token file {path:?}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Token file {0:?} is empty")]
    EmptyTokenFile(PathBuf),
    #[error("Token request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Token request returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Cannot parse token response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Gets the access token to use for the thermostat API.
///
/// With a PIN, a fresh token is requested and saved for next time. Without
/// one, the previously saved token is used.
pub async fn obtain_access_token(config: &NestConfig, pin: Option<&str>) -> Result<String, AuthError> {
    match pin {
        None => read_token(config.get_token_file()),
        Some(pin) => {
            let token = request_token(config, pin).await?;
            save_token(config.get_token_file(), &token)?;
            info!("Saved new access token to {:?}", config.get_token_file());
            Ok(token)
        }
    }
}

async fn request_token(config: &NestConfig, pin: &str) -> Result<String, AuthError> {
    debug!("Requesting access token from {}", config.get_auth_url());
    let client = Client::new();
    let response = client.post(config.get_auth_url())
        .form(&[
            ("client_id", config.get_client_id()),
            ("client_secret", config.get_client_secret()),
            ("grant_type", "authorization_code"),
            ("code", pin),
        ])
        .timeout(*config.get_timeout())
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if status != StatusCode::OK {
        return Err(AuthError::Status { status: status.as_u16(), body });
    }

    let token: TokenResponse = serde_json::from_str(&body)?;
    Ok(token.access_token)
}

fn read_token(path: &Path) -> Result<String, AuthError> {
    let token = fs::read_to_string(path)
        .map_err(|source| AuthError::TokenFile { path: path.to_owned(), source })?;
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::EmptyTokenFile(path.to_owned()));
    }
    Ok(token.to_owned())
}

fn save_token(path: &Path, token: &str) -> Result<(), AuthError> {
    fs::write(path, token)
        .map_err(|source| AuthError::TokenFile { path: path.to_owned(), source })
}
