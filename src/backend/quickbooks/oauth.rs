//! OAuth 2.0 token endpoint calls
//!
//! Both grants post a form-encoded body with the client credentials in an
//! HTTP Basic header. A rejected grant becomes `TokenRefreshFailed`; the
//! caller decides what to do with it.

use serde::Deserialize;
use url::form_urlencoded;

use crate::backend::error::BackendError;
use crate::shared::config::{ConfigError, QuickBooksSettings};

/// Successful token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchange a refresh token for a new access/refresh token pair
pub async fn refresh_access_token(
    http: &reqwest::Client,
    settings: &QuickBooksSettings,
    refresh_token: &str,
) -> Result<TokenGrant, BackendError> {
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "refresh_token")
        .append_pair("refresh_token", refresh_token)
        .finish();
    request_grant(http, settings, body).await
}

/// Exchange an authorization code from the consent redirect
pub async fn exchange_authorization_code(
    http: &reqwest::Client,
    settings: &QuickBooksSettings,
    code: &str,
) -> Result<TokenGrant, BackendError> {
    let redirect_uri = settings
        .redirect_uri
        .as_deref()
        .ok_or(ConfigError::MissingValue("QUICKBOOKS_REDIRECT_URI"))?;
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "authorization_code")
        .append_pair("code", code)
        .append_pair("redirect_uri", redirect_uri)
        .finish();
    request_grant(http, settings, body).await
}

async fn request_grant(
    http: &reqwest::Client,
    settings: &QuickBooksSettings,
    body: String,
) -> Result<TokenGrant, BackendError> {
    let client_id = settings
        .client_id
        .as_deref()
        .ok_or(ConfigError::MissingValue("QUICKBOOKS_CLIENT_ID"))?;
    let client_secret = settings
        .client_secret
        .as_deref()
        .ok_or(ConfigError::MissingValue("QUICKBOOKS_CLIENT_SECRET"))?;

    tracing::debug!("Requesting token grant from {}", settings.oauth_token_url);

    let response = http
        .post(&settings.oauth_token_url)
        .basic_auth(client_id, Some(client_secret))
        .header(reqwest::header::ACCEPT, "application/json")
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = match serde_json::from_str::<TokenErrorBody>(&text) {
            Ok(TokenErrorBody {
                error: Some(error),
                error_description,
            }) => match error_description {
                Some(desc) => format!("{}: {}", error, desc),
                None => error,
            },
            _ => text,
        };
        tracing::error!("Token endpoint returned {}: {}", status, message);
        return Err(BackendError::TokenRefreshFailed {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
