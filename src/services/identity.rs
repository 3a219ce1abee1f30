//! Keycloak admin API client.
//!
//! Every method is a single fallible remote call with no retry of its own;
//! retry is applied only at the readiness-probe layer. The shared HTTP
//! client carries a 30 second request timeout so a hung identity provider
//! call surfaces as a step failure instead of stalling startup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};

// Shared reqwest client for identity provider requests
#[allow(clippy::expect_used)]
static IDP_HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build identity provider HTTP client")
});

// Refresh the cached admin token this long before it actually expires
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(10);

// ============================================================================
// Representations
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ClientRepresentation {
    /// Internal UUID of the client
    pub id: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMapper {
    pub name: String,
    pub protocol: String,
    #[serde(rename = "protocolMapper")]
    pub protocol_mapper: String,
    #[serde(default)]
    pub config: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRepresentation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRepresentation {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

// ============================================================================
// Trait
// ============================================================================

/// Administrative operations the bootstrap sequence needs from the identity
/// provider. Abstracted behind a trait so seeding logic can be exercised
/// against a mock provider in tests.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Obtain (or refresh) an admin token. Doubles as the connectivity check.
    async fn authenticate(&self) -> Result<()>;

    async fn find_client_by_client_id(&self, client_id: &str)
        -> Result<Option<ClientRepresentation>>;

    async fn list_protocol_mappers(&self, client_uuid: &str) -> Result<Vec<ProtocolMapper>>;

    async fn add_protocol_mapper(&self, client_uuid: &str, mapper: &ProtocolMapper) -> Result<()>;

    async fn find_realm_role(&self, name: &str) -> Result<Option<RoleRepresentation>>;

    async fn create_realm_role(&self, name: &str, description: &str) -> Result<()>;

    async fn find_client_role(
        &self,
        client_uuid: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>>;

    async fn create_client_role(
        &self,
        client_uuid: &str,
        name: &str,
        description: &str,
    ) -> Result<()>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRepresentation>>;

    async fn assign_realm_roles(&self, user_id: &str, roles: &[RoleRepresentation]) -> Result<()>;
}

// ============================================================================
// Keycloak implementation
// ============================================================================

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct KeycloakAdminClient {
    base_url: String,
    realm: String,
    admin_username: String,
    admin_password: String,
    token: RwLock<Option<CachedToken>>,
}

impl KeycloakAdminClient {
    pub fn new(
        base_url: impl Into<String>,
        realm: impl Into<String>,
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            realm: realm.into(),
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
            token: RwLock::new(None),
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            CONFIG.identity.base_url.clone(),
            CONFIG.identity.realm.clone(),
            CONFIG.identity.admin_username.clone(),
            CONFIG.identity.admin_password.clone(),
        )
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/realms/{}{}", self.base_url, self.realm, path)
    }

    /// Return a cached admin token or fetch a fresh one via password grant
    /// against the master realm.
    async fn admin_token(&self) -> Result<String> {
        {
            let cache = self.token.read();
            if let Some(token) = cache.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let url = format!(
            "{}/realms/master/protocol/openid-connect/token",
            self.base_url
        );
        let params = [
            ("grant_type", "password"),
            ("client_id", "admin-cli"),
            ("username", self.admin_username.as_str()),
            ("password", self.admin_password.as_str()),
        ];

        let response = IDP_HTTP_CLIENT.post(&url).form(&params).send().await?;
        let response = check_response(response, "admin token").await?;
        let token: TokenResponse = response.json().await?;

        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);
        let access_token = token.access_token.clone();
        *self.token.write() = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }

    async fn get(&self, path: &str, context: &str) -> Result<reqwest::Response> {
        let token = self.admin_token().await?;
        let response = IDP_HTTP_CLIENT
            .get(self.admin_url(path))
            .bearer_auth(token)
            .send()
            .await?;
        check_response(response, context).await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        context: &str,
    ) -> Result<reqwest::Response> {
        let token = self.admin_token().await?;
        let response = IDP_HTTP_CLIENT
            .post(self.admin_url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        check_response(response, context).await
    }
}

/// Map a non-success identity provider response to an error, preserving
/// 404 so callers can turn it into `None`.
async fn check_response(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!(
            "Identity provider resource not found ({})",
            context
        )));
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::ServiceUnavailable(format!(
        "Identity provider error ({}): {} {}",
        context, status, body
    )))
}

// Names and usernames can come from configuration, so they are encoded
// before landing in a path or query string.

fn client_query_path(client_id: &str) -> String {
    format!("/clients?clientId={}", urlencoding::encode(client_id))
}

fn realm_role_path(name: &str) -> String {
    format!("/roles/{}", urlencoding::encode(name))
}

fn client_role_path(client_uuid: &str, name: &str) -> String {
    format!("/clients/{}/roles/{}", client_uuid, urlencoding::encode(name))
}

fn user_query_path(username: &str) -> String {
    format!("/users?username={}&exact=true", urlencoding::encode(username))
}

fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl IdentityAdmin for KeycloakAdminClient {
    async fn authenticate(&self) -> Result<()> {
        self.admin_token().await.map(|_| ())
    }

    async fn find_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientRepresentation>> {
        let response = self.get(&client_query_path(client_id), "find client").await?;
        let clients: Vec<ClientRepresentation> = response.json().await?;
        Ok(clients.into_iter().find(|c| c.client_id == client_id))
    }

    async fn list_protocol_mappers(&self, client_uuid: &str) -> Result<Vec<ProtocolMapper>> {
        let response = self
            .get(
                &format!("/clients/{}/protocol-mappers/models", client_uuid),
                "list protocol mappers",
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn add_protocol_mapper(&self, client_uuid: &str, mapper: &ProtocolMapper) -> Result<()> {
        self.post_json(
            &format!("/clients/{}/protocol-mappers/models", client_uuid),
            mapper,
            "add protocol mapper",
        )
        .await
        .map(|_| ())
    }

    async fn find_realm_role(&self, name: &str) -> Result<Option<RoleRepresentation>> {
        let result = self.get(&realm_role_path(name), "find realm role").await;
        match not_found_as_none(result)? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    async fn create_realm_role(&self, name: &str, description: &str) -> Result<()> {
        let body = serde_json::json!({ "name": name, "description": description });
        self.post_json("/roles", &body, "create realm role")
            .await
            .map(|_| ())
    }

    async fn find_client_role(
        &self,
        client_uuid: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>> {
        let result = self
            .get(&client_role_path(client_uuid, name), "find client role")
            .await;
        match not_found_as_none(result)? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    async fn create_client_role(
        &self,
        client_uuid: &str,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let body = serde_json::json!({ "name": name, "description": description });
        self.post_json(
            &format!("/clients/{}/roles", client_uuid),
            &body,
            "create client role",
        )
        .await
        .map(|_| ())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRepresentation>> {
        let response = self.get(&user_query_path(username), "find user").await?;
        let users: Vec<UserRepresentation> = response.json().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn assign_realm_roles(&self, user_id: &str, roles: &[RoleRepresentation]) -> Result<()> {
        self.post_json(
            &format!("/users/{}/role-mappings/realm", user_id),
            roles,
            "assign realm roles",
        )
        .await
        .map(|_| ())
    }
}
