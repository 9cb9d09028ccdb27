//! Application configuration module
//!
//! Settings are read from the process environment (the server binary loads a
//! `.env` file first) and assembled through [`SettingsBuilder`], which also
//! validates them. Tests build settings directly with the builder.

use std::path::PathBuf;
use thiserror::Error;

/// QuickBooks API host for sandbox companies
pub const SANDBOX_API_BASE: &str = "https://sandbox-quickbooks.api.intuit.com";
/// QuickBooks API host for production companies
pub const PRODUCTION_API_BASE: &str = "https://quickbooks.api.intuit.com";
/// Intuit OAuth 2.0 token endpoint
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
/// API minor version sent with every accounting request
pub const DEFAULT_MINOR_VERSION: u32 = 65;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_EXPENSE_ACCOUNT_ID: &str = "1";
const DATA_DIR_NAME: &str = "fieldops-sync";

/// Which QuickBooks environment the company lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickBooksEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl QuickBooksEnvironment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" | "development" => Some(Self::Sandbox),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// API host matching the environment
    pub fn api_base(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_API_BASE,
            Self::Production => PRODUCTION_API_BASE,
        }
    }
}

/// QuickBooks connection settings
#[derive(Debug, Clone)]
pub struct QuickBooksSettings {
    /// OAuth client id (needed to refresh or connect)
    pub client_id: Option<String>,
    /// OAuth client secret (needed to refresh or connect)
    pub client_secret: Option<String>,
    /// Redirect URI registered with the OAuth app (needed to connect)
    pub redirect_uri: Option<String>,
    pub environment: QuickBooksEnvironment,
    /// Base URL of the accounting API, without trailing slash
    pub api_base: String,
    /// OAuth token endpoint
    pub oauth_token_url: String,
    /// Shared secret used to verify webhook signatures
    pub webhook_verifier_token: Option<String>,
    /// Expense account used for purchase order and bill lines without a mapped product
    pub expense_account_id: String,
    pub minor_version: u32,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// sqlx connection URL for the local database
    pub database_url: String,
    /// Port the HTTP server binds to
    pub server_port: u16,
    /// Root directory of the local file store
    pub attachment_dir: PathBuf,
    pub quickbooks: QuickBooksSettings,
}

impl Settings {
    /// Create a new SettingsBuilder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load settings from environment variables
    ///
    /// Unset variables fall back to defaults; set-but-invalid variables are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Settings::builder();

        if let Some(url) = env_var("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(port) = env_var("SERVER_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT", port.clone()))?;
            builder = builder.server_port(port);
        }
        if let Some(dir) = env_var("ATTACHMENT_STORE_DIR") {
            builder = builder.attachment_dir(PathBuf::from(dir));
        }
        if let Some(env) = env_var("QUICKBOOKS_ENVIRONMENT") {
            let parsed = QuickBooksEnvironment::from_str(&env)
                .ok_or_else(|| ConfigError::InvalidValue("QUICKBOOKS_ENVIRONMENT", env.clone()))?;
            builder = builder.environment(parsed);
        }
        if let Some(base) = env_var("QUICKBOOKS_API_BASE") {
            builder = builder.api_base(base);
        }
        if let Some(url) = env_var("QUICKBOOKS_OAUTH_TOKEN_URL") {
            builder = builder.oauth_token_url(url);
        }
        if let Some(id) = env_var("QUICKBOOKS_CLIENT_ID") {
            builder = builder.client_id(id);
        }
        if let Some(secret) = env_var("QUICKBOOKS_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(uri) = env_var("QUICKBOOKS_REDIRECT_URI") {
            builder = builder.redirect_uri(uri);
        }
        if let Some(token) = env_var("QUICKBOOKS_WEBHOOK_VERIFIER_TOKEN") {
            builder = builder.webhook_verifier_token(token);
        }
        if let Some(account) = env_var("QUICKBOOKS_EXPENSE_ACCOUNT_ID") {
            builder = builder.expense_account_id(account);
        }

        builder.build()
    }

    /// Default data directory (`<platform data dir>/fieldops-sync`)
    pub fn default_data_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push(DATA_DIR_NAME);
        path
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builder for Settings
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    database_url: Option<String>,
    server_port: Option<u16>,
    attachment_dir: Option<PathBuf>,
    environment: QuickBooksEnvironment,
    api_base: Option<String>,
    oauth_token_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    webhook_verifier_token: Option<String>,
    expense_account_id: Option<String>,
}

impl SettingsBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    pub fn attachment_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachment_dir = Some(dir.into());
        self
    }

    pub fn environment(mut self, environment: QuickBooksEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the accounting API base URL (used against mock servers)
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    pub fn oauth_token_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_token_url = Some(url.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn webhook_verifier_token(mut self, token: impl Into<String>) -> Self {
        self.webhook_verifier_token = Some(token.into());
        self
    }

    pub fn expense_account_id(mut self, account: impl Into<String>) -> Self {
        self.expense_account_id = Some(account.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Settings, ConfigError> {
        let data_dir = Settings::default_data_dir();

        let api_base = self
            .api_base
            .unwrap_or_else(|| self.environment.api_base().to_string());
        let oauth_token_url = self
            .oauth_token_url
            .unwrap_or_else(|| DEFAULT_OAUTH_TOKEN_URL.to_string());

        for url in [&api_base, &oauth_token_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }

        let database_url = self.database_url.unwrap_or_else(|| {
            format!("sqlite://{}", data_dir.join("sync.db").to_string_lossy())
        });
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidValue("DATABASE_URL", database_url));
        }

        Ok(Settings {
            database_url,
            server_port: self.server_port.unwrap_or(DEFAULT_SERVER_PORT),
            attachment_dir: self.attachment_dir.unwrap_or_else(|| data_dir.join("files")),
            quickbooks: QuickBooksSettings {
                client_id: self.client_id,
                client_secret: self.client_secret,
                redirect_uri: self.redirect_uri,
                environment: self.environment,
                api_base: api_base.trim_end_matches('/').to_string(),
                oauth_token_url,
                webhook_verifier_token: self.webhook_verifier_token,
                expense_account_id: self
                    .expense_account_id
                    .unwrap_or_else(|| DEFAULT_EXPENSE_ACCOUNT_ID.to_string()),
                minor_version: DEFAULT_MINOR_VERSION,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {0}: '{1}'")]
    InvalidValue(&'static str, String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
