use crate::config::ShopifyConfig;
use crate::errors::ServiceError;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

const ADMIN_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const STOREFRONT_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Low-level transport for the Shopify Admin REST, Admin GraphQL and
/// Storefront GraphQL APIs.
///
/// Base URLs are held explicitly (rather than rebuilt from the store
/// domain per call) so tests can point the client at a local double.
#[derive(Debug, Clone)]
pub struct ShopifyClient {
    http: reqwest::Client,
    admin_base: String,
    storefront_base: String,
    admin_token: String,
    storefront_token: Option<String>,
}

impl ShopifyClient {
    /// Build a client from application configuration. Returns `None`
    /// when the integration is not configured.
    pub fn from_config(cfg: &ShopifyConfig) -> Option<Self> {
        let domain = cfg.store_domain.as_deref()?;
        let admin_token = cfg.admin_access_token.clone()?;

        Some(Self::new(
            format!("https://{}/admin/api/{}", domain, cfg.api_version),
            format!("https://{}/api/{}", domain, cfg.api_version),
            admin_token,
            cfg.storefront_access_token.clone(),
        ))
    }

    pub fn new(
        admin_base: impl Into<String>,
        storefront_base: impl Into<String>,
        admin_token: impl Into<String>,
        storefront_token: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            admin_base: admin_base.into().trim_end_matches('/').to_string(),
            storefront_base: storefront_base.into().trim_end_matches('/').to_string(),
            admin_token: admin_token.into(),
            storefront_token,
        }
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/{}", self.admin_base, path.trim_start_matches('/'))
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ShopifyApi(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::ShopifyApi(format!("invalid response body: {e}")))
    }

    #[instrument(skip(self))]
    pub async fn admin_get(&self, path: &str) -> Result<Value, ServiceError> {
        let response = self
            .http
            .get(self.admin_url(path))
            .header(ADMIN_TOKEN_HEADER, &self.admin_token)
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, body))]
    pub async fn admin_post(&self, path: &str, body: &Value) -> Result<Value, ServiceError> {
        let response = self
            .http
            .post(self.admin_url(path))
            .header(ADMIN_TOKEN_HEADER, &self.admin_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, body))]
    pub async fn admin_put(&self, path: &str, body: &Value) -> Result<Value, ServiceError> {
        let response = self
            .http
            .put(self.admin_url(path))
            .header(ADMIN_TOKEN_HEADER, &self.admin_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;
        Self::read_json(response).await
    }

    #[instrument(skip(self))]
    pub async fn admin_delete(&self, path: &str) -> Result<(), ServiceError> {
        let response = self
            .http
            .delete(self.admin_url(path))
            .header(ADMIN_TOKEN_HEADER, &self.admin_token)
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ShopifyApi(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    /// Execute an Admin GraphQL query; GraphQL-level errors are
    /// surfaced as `ShopifyApi` with the joined messages.
    #[instrument(skip(self, query, variables))]
    pub async fn admin_graphql(&self, query: &str, variables: Value) -> Result<Value, ServiceError> {
        let response = self
            .http
            .post(self.admin_url("graphql.json"))
            .header(ADMIN_TOKEN_HEADER, &self.admin_token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;

        let body = Self::read_json(response).await?;
        Self::unwrap_graphql_data(body)
    }

    /// Execute a Storefront GraphQL query (checkout mutations).
    #[instrument(skip(self, query, variables))]
    pub async fn storefront_graphql(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<Value, ServiceError> {
        let token = self.storefront_token.as_deref().ok_or_else(|| {
            ServiceError::ShopifyApi("storefront access token not configured".to_string())
        })?;

        let response = self
            .http
            .post(format!("{}/graphql.json", self.storefront_base))
            .header(STOREFRONT_TOKEN_HEADER, token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| ServiceError::ShopifyApi(e.to_string()))?;

        let body = Self::read_json(response).await?;
        Self::unwrap_graphql_data(body)
    }

    fn unwrap_graphql_data(body: Value) -> Result<Value, ServiceError> {
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ServiceError::ShopifyApi(joined));
            }
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}
