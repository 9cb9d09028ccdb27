//! QuickBooks accounting API client
//!
//! Thin wrapper over one shared `reqwest::Client`. Every call takes the
//! [`Connection`] handed out by the token manager; the client itself holds no
//! credentials.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::types::{QueryEnvelope, QueryResponse};
use crate::backend::error::BackendError;
use crate::shared::accounting::EntityType;
use crate::shared::config::{ConfigError, QuickBooksSettings};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A usable access token and the company it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub access_token: String,
    pub realm_id: String,
}

#[derive(Debug, Clone)]
pub struct QuickBooksClient {
    http: reqwest::Client,
    api_base: String,
    minor_version: u32,
}

impl QuickBooksClient {
    pub fn new(settings: &QuickBooksSettings) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http(http, settings))
    }

    /// Build a client around an existing HTTP client
    pub fn with_http(http: reqwest::Client, settings: &QuickBooksSettings) -> Self {
        Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            minor_version: settings.minor_version,
        }
    }

    /// Underlying HTTP client, shared with the OAuth calls
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn company_url(&self, conn: &Connection, path: &str) -> Result<Url, BackendError> {
        let raw = format!("{}/v3/company/{}/{}", self.api_base, conn.realm_id, path);
        let mut url = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(raw.clone()))?;
        url.query_pairs_mut()
            .append_pair("minorversion", &self.minor_version.to_string());
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, conn: &Connection) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&conn.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Run a QuickBooks SQL-like query
    pub async fn query(&self, conn: &Connection, query: &str) -> Result<QueryResponse, BackendError> {
        let mut url = self.company_url(conn, "query")?;
        url.query_pairs_mut().append_pair("query", query);

        tracing::debug!(realm_id = %conn.realm_id, "QuickBooks query: {}", query);
        let response = self.request(Method::GET, url, conn).send().await?;
        let envelope: QueryEnvelope = parse_response(response).await?;
        Ok(envelope.query_response)
    }

    /// Fetch one record by id
    pub async fn get_entity<T: DeserializeOwned>(
        &self,
        conn: &Connection,
        entity: EntityType,
        id: &str,
    ) -> Result<T, BackendError> {
        let path = format!("{}/{}", entity_path(entity), id);
        let url = self.company_url(conn, &path)?;

        tracing::debug!(realm_id = %conn.realm_id, "QuickBooks GET {}", path);
        let response = self.request(Method::GET, url, conn).send().await?;
        let body: serde_json::Value = parse_response(response).await?;
        unwrap_entity(body, entity)
    }

    /// Create a record, or sparse-update it when the payload carries an id
    pub async fn post_entity<P: Serialize, T: DeserializeOwned>(
        &self,
        conn: &Connection,
        entity: EntityType,
        payload: &P,
    ) -> Result<T, BackendError> {
        let url = self.company_url(conn, entity_path(entity))?;

        tracing::debug!(realm_id = %conn.realm_id, "QuickBooks POST {}", entity_path(entity));
        let response = self
            .request(Method::POST, url, conn)
            .json(payload)
            .send()
            .await?;
        let body: serde_json::Value = parse_response(response).await?;
        unwrap_entity(body, entity)
    }

    /// Ask QuickBooks for a fresh temporary download URL of an attachment
    pub async fn attachment_download_url(
        &self,
        conn: &Connection,
        attachable_id: &str,
    ) -> Result<String, BackendError> {
        let url = self.company_url(conn, &format!("download/{}", attachable_id))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&conn.access_token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// Download bytes from a pre-signed URL
    pub async fn download(&self, url: &str) -> Result<Bytes, BackendError> {
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?)
    }
}

/// Path segment of an entity in the REST API (`purchaseorder`, `item`, ...)
fn entity_path(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Customer => "customer",
        EntityType::Vendor => "vendor",
        EntityType::Product => "item",
        EntityType::Invoice => "invoice",
        EntityType::Estimate => "estimate",
        EntityType::Bill => "bill",
        EntityType::PurchaseOrder => "purchaseorder",
    }
}

/// Single-entity responses wrap the record in an object keyed by entity name
fn unwrap_entity<T: DeserializeOwned>(
    mut body: serde_json::Value,
    entity: EntityType,
) -> Result<T, BackendError> {
    let record = body
        .get_mut(entity.remote_name())
        .map(serde_json::Value::take)
        .ok_or_else(|| BackendError::RemoteApi {
            status: StatusCode::OK.as_u16(),
            body: format!("response has no {} object", entity.remote_name()),
        })?;
    Ok(serde_json::from_value(record)?)
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("QuickBooks request failed with {}: {}", status, body);
    Err(BackendError::RemoteApi {
        status: status.as_u16(),
        body,
    })
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Deserialize the raw rows of a query result
pub fn rows<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> Result<Vec<T>, BackendError> {
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(BackendError::from))
        .collect()
}
