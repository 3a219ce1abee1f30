//! Idempotent reference-data provisioning.
//!
//! Every step converges on a desired state via existence checks, never
//! blind inserts, so re-running a step after partial success is safe and
//! a second run creates zero duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{endpoint, role_permission, static_page};
use crate::services::identity::{IdentityAdmin, ProtocolMapper};

// ============================================================================
// Step identity
// ============================================================================

/// Named, independently re-runnable seeding steps, in execution order.
/// The privileged-account assignment is sequenced by the orchestrator but is
/// not part of this set: it is non-critical and has no desired-state catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStep {
    Roles,
    ClaimMappers,
    Endpoints,
    RolePermissions,
    StaticPages,
}

impl SeedStep {
    pub const ALL: [SeedStep; 5] = [
        SeedStep::Roles,
        SeedStep::ClaimMappers,
        SeedStep::Endpoints,
        SeedStep::RolePermissions,
        SeedStep::StaticPages,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SeedStep::Roles => "roles",
            SeedStep::ClaimMappers => "claimMappers",
            SeedStep::Endpoints => "endpoints",
            SeedStep::RolePermissions => "rolePermissions",
            SeedStep::StaticPages => "staticPages",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for SeedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Reference catalogs
// ============================================================================

/// Realm-level roles: (name, description)
pub const REALM_ROLES: &[(&str, &str)] = &[
    ("admin", "Full administrative access"),
    ("merchant", "Merchant account"),
    ("support", "Read-only support access"),
];

/// Client-scoped roles on the application client: (name, description)
pub const CLIENT_ROLES: &[(&str, &str)] = &[
    ("payments.manage", "Create and modify payment configuration"),
    ("payments.view", "View payment configuration"),
];

/// Realm roles granted to the configured privileged account
const PRIVILEGED_ROLES: &[&str] = &["admin"];

/// Token claim mappers: (mapper name, user attribute, token claim)
pub const CLAIM_MAPPERS: &[(&str, &str, &str)] = &[
    ("merchant-id-mapper", "merchantId", "merchant_id"),
    ("phone-number-mapper", "phoneNumber", "phone_number"),
    ("locale-mapper", "locale", "locale"),
];

/// Administrative endpoint catalog: (method, path, description)
const ENDPOINT_CATALOG: &[(&str, &str, &str)] = &[
    ("GET", "/api/credentials", "List payment credentials"),
    ("POST", "/api/credentials", "Create a payment credential"),
    ("GET", "/api/credentials/active", "Get the active credential"),
    ("GET", "/api/credentials/{id}", "Get a payment credential"),
    ("PATCH", "/api/credentials/{id}", "Update a payment credential"),
    ("PUT", "/api/credentials/{id}/activate", "Activate a credential"),
    ("DELETE", "/api/credentials/{id}", "Delete a payment credential"),
    ("GET", "/api/bootstrap/status", "Bootstrap status"),
    ("POST", "/api/bootstrap/run", "Re-run the bootstrap sequence"),
    ("POST", "/api/bootstrap/steps/{name}/run", "Re-run one bootstrap step"),
];

/// Role-to-endpoint grants: (role, method, path)
const ROLE_PERMISSION_CATALOG: &[(&str, &str, &str)] = &[
    ("admin", "GET", "/api/credentials"),
    ("admin", "POST", "/api/credentials"),
    ("admin", "GET", "/api/credentials/active"),
    ("admin", "GET", "/api/credentials/{id}"),
    ("admin", "PATCH", "/api/credentials/{id}"),
    ("admin", "PUT", "/api/credentials/{id}/activate"),
    ("admin", "DELETE", "/api/credentials/{id}"),
    ("admin", "GET", "/api/bootstrap/status"),
    ("admin", "POST", "/api/bootstrap/run"),
    ("admin", "POST", "/api/bootstrap/steps/{name}/run"),
    ("support", "GET", "/api/credentials"),
    ("support", "GET", "/api/credentials/active"),
    ("support", "GET", "/api/credentials/{id}"),
    ("support", "GET", "/api/bootstrap/status"),
];

/// Static page catalog: (slug, title, content)
const STATIC_PAGE_CATALOG: &[(&str, &str, &str)] = &[
    (
        "about",
        "About",
        "Placeholder about page. Edit through the admin interface.",
    ),
    (
        "privacy-policy",
        "Privacy Policy",
        "Placeholder privacy policy. Edit through the admin interface.",
    ),
    (
        "terms-of-service",
        "Terms of Service",
        "Placeholder terms of service. Edit through the admin interface.",
    ),
];

fn user_attribute_mapper(name: &str, attribute: &str, claim: &str) -> ProtocolMapper {
    let mut config = HashMap::new();
    config.insert("user.attribute".to_string(), attribute.to_string());
    config.insert("claim.name".to_string(), claim.to_string());
    config.insert("jsonType.label".to_string(), "String".to_string());
    config.insert("id.token.claim".to_string(), "true".to_string());
    config.insert("access.token.claim".to_string(), "true".to_string());
    config.insert("userinfo.token.claim".to_string(), "true".to_string());
    ProtocolMapper {
        name: name.to_string(),
        protocol: "openid-connect".to_string(),
        protocol_mapper: "oidc-usermodel-attribute-mapper".to_string(),
        config,
    }
}

// ============================================================================
// Seeding service
// ============================================================================

pub struct SeedingService {
    db: DatabaseConnection,
    identity: Arc<dyn IdentityAdmin>,
    client_id: String,
    privileged_account: Option<String>,
}

impl SeedingService {
    pub fn new(
        db: DatabaseConnection,
        identity: Arc<dyn IdentityAdmin>,
        client_id: impl Into<String>,
        privileged_account: Option<String>,
    ) -> Self {
        Self {
            db,
            identity,
            client_id: client_id.into(),
            privileged_account,
        }
    }

    pub fn from_config(db: DatabaseConnection, identity: Arc<dyn IdentityAdmin>) -> Self {
        Self::new(
            db,
            identity,
            CONFIG.identity.client_id.clone(),
            CONFIG.identity.privileged_account.clone(),
        )
    }

    /// Dispatch one named step.
    pub async fn run(&self, step: SeedStep) -> Result<()> {
        match step {
            SeedStep::Roles => self.seed_roles().await,
            SeedStep::ClaimMappers => self.seed_claim_mappers().await,
            SeedStep::Endpoints => self.seed_endpoints().await,
            SeedStep::RolePermissions => self.seed_role_permissions().await,
            SeedStep::StaticPages => self.seed_static_pages().await,
        }
    }

    /// Ensure the fixed realm and client role catalogs exist.
    ///
    /// This is also the readiness probe call: an unreachable identity
    /// provider fails `authenticate` and the whole step. A create failure
    /// for a single role only logs a warning, a catalog gap must not fail
    /// the pipeline.
    pub async fn seed_roles(&self) -> Result<()> {
        self.identity.authenticate().await?;

        for (name, description) in REALM_ROLES {
            match self.identity.find_realm_role(name).await? {
                Some(_) => tracing::debug!("Realm role '{}' already exists", name),
                None => {
                    tracing::info!("Creating realm role '{}'", name);
                    if let Err(e) = self.identity.create_realm_role(name, description).await {
                        tracing::warn!("Failed to create realm role '{}': {}", name, e);
                    }
                }
            }
        }

        let client = self
            .identity
            .find_client_by_client_id(&self.client_id)
            .await?;
        let Some(client) = client else {
            tracing::warn!(
                "Client '{}' not found, skipping client role seeding",
                self.client_id
            );
            return Ok(());
        };

        for (name, description) in CLIENT_ROLES {
            match self.identity.find_client_role(&client.id, name).await? {
                Some(_) => tracing::debug!("Client role '{}' already exists", name),
                None => {
                    tracing::info!("Creating client role '{}'", name);
                    if let Err(e) = self
                        .identity
                        .create_client_role(&client.id, name, description)
                        .await
                    {
                        tracing::warn!("Failed to create client role '{}': {}", name, e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Ensure the token claim mappers exist on the application client.
    /// Each mapper addition is individually fault-isolated: one failing
    /// mapper logs a warning and the loop proceeds to the next.
    pub async fn seed_claim_mappers(&self) -> Result<()> {
        let client = self
            .identity
            .find_client_by_client_id(&self.client_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Client '{}' not found in identity provider",
                    self.client_id
                ))
            })?;

        let existing = self.identity.list_protocol_mappers(&client.id).await?;

        for (name, attribute, claim) in CLAIM_MAPPERS {
            if existing.iter().any(|m| m.name == *name) {
                tracing::debug!("Protocol mapper '{}' already exists", name);
                continue;
            }
            let mapper = user_attribute_mapper(name, attribute, claim);
            tracing::info!("Adding protocol mapper '{}'", name);
            if let Err(e) = self.identity.add_protocol_mapper(&client.id, &mapper).await {
                tracing::warn!("Failed to add protocol mapper '{}': {}", name, e);
            }
        }

        Ok(())
    }

    /// Grant the admin realm roles to the configured privileged account.
    /// Returns Ok(false) when no account is configured, which is a warning
    /// rather than an error.
    pub async fn assign_privileged_account_roles(&self) -> Result<bool> {
        let Some(account) = self.privileged_account.as_deref() else {
            tracing::warn!(
                "No privileged account configured, skipping role assignment"
            );
            return Ok(false);
        };

        let user = self
            .identity
            .find_user_by_username(account)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Privileged account '{}' not found", account))
            })?;

        let mut roles = Vec::new();
        for name in PRIVILEGED_ROLES {
            match self.identity.find_realm_role(name).await? {
                Some(role) => roles.push(role),
                None => tracing::warn!(
                    "Realm role '{}' missing, cannot grant it to '{}'",
                    name,
                    account
                ),
            }
        }

        if roles.is_empty() {
            tracing::warn!("No grantable roles found for '{}'", account);
            return Ok(true);
        }

        self.identity.assign_realm_roles(&user.id, &roles).await?;
        tracing::info!(
            "Granted {} realm role(s) to privileged account '{}'",
            roles.len(),
            account
        );
        Ok(true)
    }

    /// Ensure the administrative endpoint catalog exists (find-or-create
    /// by path + method).
    pub async fn seed_endpoints(&self) -> Result<()> {
        let now = Utc::now();
        let mut created = 0;

        for (method, path, description) in ENDPOINT_CATALOG {
            let existing = Endpoint::find()
                .filter(endpoint::Column::Path.eq(*path))
                .filter(endpoint::Column::Method.eq(*method))
                .one(&self.db)
                .await?;

            if existing.is_none() {
                let entry = endpoint::ActiveModel {
                    path: Set(path.to_string()),
                    method: Set(method.to_string()),
                    description: Set(Some(description.to_string())),
                    created_at: Set(now),
                    ..Default::default()
                };
                entry.insert(&self.db).await?;
                created += 1;
            }
        }

        tracing::info!(
            "Endpoint catalog seeded ({} created, {} total)",
            created,
            ENDPOINT_CATALOG.len()
        );
        Ok(())
    }

    /// Ensure role-to-endpoint grants exist (find-or-create by role +
    /// endpoint + method).
    pub async fn seed_role_permissions(&self) -> Result<()> {
        let now = Utc::now();
        let mut created = 0;

        for (role, method, path) in ROLE_PERMISSION_CATALOG {
            let existing = RolePermission::find()
                .filter(role_permission::Column::RoleName.eq(*role))
                .filter(role_permission::Column::EndpointPath.eq(*path))
                .filter(role_permission::Column::Method.eq(*method))
                .one(&self.db)
                .await?;

            if existing.is_none() {
                let entry = role_permission::ActiveModel {
                    role_name: Set(role.to_string()),
                    endpoint_path: Set(path.to_string()),
                    method: Set(method.to_string()),
                    created_at: Set(now),
                    ..Default::default()
                };
                entry.insert(&self.db).await?;
                created += 1;
            }
        }

        tracing::info!(
            "Role permissions seeded ({} created, {} total)",
            created,
            ROLE_PERMISSION_CATALOG.len()
        );
        Ok(())
    }

    /// Ensure the static page set exists (find-or-create by slug).
    pub async fn seed_static_pages(&self) -> Result<()> {
        let now = Utc::now();
        let mut created = 0;

        for (slug, title, content) in STATIC_PAGE_CATALOG {
            let existing = StaticPage::find()
                .filter(static_page::Column::Slug.eq(*slug))
                .one(&self.db)
                .await?;

            if existing.is_none() {
                let entry = static_page::ActiveModel {
                    slug: Set(slug.to_string()),
                    title: Set(title.to_string()),
                    content: Set(content.to_string()),
                    created_at: Set(now),
                    ..Default::default()
                };
                entry.insert(&self.db).await?;
                created += 1;
            }
        }

        tracing::info!(
            "Static pages seeded ({} created, {} total)",
            created,
            STATIC_PAGE_CATALOG.len()
        );
        Ok(())
    }
}
