//! Test helpers and utilities for unit and integration testing.
//!
//! Provides an in-memory SQLite database, a configurable mock identity
//! provider, and service construction helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use payadmin::error::{AppError, Result};
use payadmin::migrations::Migrator;
use payadmin::services::credentials::CredentialService;
use payadmin::services::crypto::FieldCipher;
use payadmin::services::identity::{
    ClientRepresentation, IdentityAdmin, ProtocolMapper, RoleRepresentation, UserRepresentation,
};
use payadmin::services::orchestrator::BootstrapOrchestrator;
use payadmin::services::readiness::ReadinessProbe;
use payadmin::services::seeding::SeedingService;
use payadmin::state::AppState;

/// Client ID the mock provider registers by default
pub const TEST_CLIENT_ID: &str = "payadmin-web";

/// Internal UUID the mock assigns to the default client
pub const TEST_CLIENT_UUID: &str = "client-uuid-1";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Use simple in-memory SQLite - each connection gets its own database
    let db_url = "sqlite::memory:";

    let db = Database::connect(db_url)
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Cipher with a fixed test secret
pub fn test_cipher() -> FieldCipher {
    FieldCipher::new("test-credential-secret")
}

/// Credential service backed by the given database and the test cipher
pub fn build_credential_service(db: DatabaseConnection) -> CredentialService {
    CredentialService::new(db, test_cipher())
}

/// Seeding service wired to the mock provider, with a privileged account
/// configured
pub fn build_seeding(db: DatabaseConnection, mock: Arc<MockIdentityAdmin>) -> SeedingService {
    SeedingService::new(db, mock, TEST_CLIENT_ID, Some("admin".to_string()))
}

/// Seeding service with no privileged account configured
pub fn build_seeding_without_account(
    db: DatabaseConnection,
    mock: Arc<MockIdentityAdmin>,
) -> SeedingService {
    SeedingService::new(db, mock, TEST_CLIENT_ID, None)
}

/// Orchestrator with a fast probe (3 attempts, 10ms apart)
pub fn build_orchestrator(seeding: SeedingService) -> BootstrapOrchestrator {
    BootstrapOrchestrator::new(
        seeding,
        ReadinessProbe::new(3, std::time::Duration::from_millis(10)),
    )
}

/// Full application state for router tests
pub fn build_app_state(db: DatabaseConnection, mock: Arc<MockIdentityAdmin>) -> AppState {
    AppState::new(db, mock)
}

// ============================================================================
// Mock identity provider
// ============================================================================

#[derive(Default)]
struct MockState {
    realm_roles: HashMap<String, RoleRepresentation>,
    clients: Vec<ClientRepresentation>,
    client_roles: HashMap<String, HashMap<String, RoleRepresentation>>,
    protocol_mappers: HashMap<String, Vec<ProtocolMapper>>,
    users: HashMap<String, UserRepresentation>,
    assigned_roles: HashMap<String, Vec<String>>,
    authenticate_failures_remaining: u32,
    fail_authenticate: bool,
    fail_assign_roles: bool,
    fail_create_role: Option<String>,
    fail_add_mapper: Option<String>,
    authenticate_calls: u32,
    realm_roles_created: Vec<String>,
    client_roles_created: Vec<String>,
    mappers_added: Vec<String>,
}

/// In-memory stand-in for the Keycloak admin API. All state is behind a
/// mutex so the mock can be shared as `Arc<dyn IdentityAdmin>` and still be
/// reconfigured and inspected from the test body.
#[derive(Default)]
pub struct MockIdentityAdmin {
    state: Mutex<MockState>,
}

impl MockIdentityAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock with the application client and an "admin" user registered,
    /// which is what a correctly pre-provisioned realm looks like.
    pub fn with_defaults() -> Self {
        let mock = Self::new();
        mock.register_client(TEST_CLIENT_ID, TEST_CLIENT_UUID);
        mock.register_user("admin", "user-uuid-admin");
        mock
    }

    pub fn register_client(&self, client_id: &str, uuid: &str) {
        self.state.lock().clients.push(ClientRepresentation {
            id: uuid.to_string(),
            client_id: client_id.to_string(),
        });
    }

    pub fn register_user(&self, username: &str, id: &str) {
        self.state.lock().users.insert(
            username.to_string(),
            UserRepresentation {
                id: id.to_string(),
                username: username.to_string(),
            },
        );
    }

    pub fn register_realm_role(&self, name: &str) {
        self.state.lock().realm_roles.insert(
            name.to_string(),
            RoleRepresentation {
                id: format!("role-{}", name),
                name: name.to_string(),
                description: None,
            },
        );
    }

    pub fn register_protocol_mapper(&self, client_uuid: &str, mapper: ProtocolMapper) {
        self.state
            .lock()
            .protocol_mappers
            .entry(client_uuid.to_string())
            .or_default()
            .push(mapper);
    }

    /// Make `authenticate` fail this many times, then succeed
    pub fn fail_authenticate_times(&self, n: u32) {
        self.state.lock().authenticate_failures_remaining = n;
    }

    /// Make `authenticate` fail on every call
    pub fn fail_authenticate_always(&self) {
        self.state.lock().fail_authenticate = true;
    }

    pub fn fail_assign_roles(&self) {
        self.state.lock().fail_assign_roles = true;
    }

    /// Make creating the named realm or client role fail
    pub fn fail_create_role_named(&self, name: &str) {
        self.state.lock().fail_create_role = Some(name.to_string());
    }

    /// Make adding the named protocol mapper fail
    pub fn fail_add_mapper_named(&self, name: &str) {
        self.state.lock().fail_add_mapper = Some(name.to_string());
    }

    pub fn authenticate_calls(&self) -> u32 {
        self.state.lock().authenticate_calls
    }

    pub fn realm_roles_created(&self) -> Vec<String> {
        self.state.lock().realm_roles_created.clone()
    }

    pub fn client_roles_created(&self) -> Vec<String> {
        self.state.lock().client_roles_created.clone()
    }

    pub fn mappers_added(&self) -> Vec<String> {
        self.state.lock().mappers_added.clone()
    }

    /// Realm role names assigned to the given user id
    pub fn roles_assigned_to(&self, user_id: &str) -> Vec<String> {
        self.state
            .lock()
            .assigned_roles
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityAdmin for MockIdentityAdmin {
    async fn authenticate(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.authenticate_calls += 1;
        if state.fail_authenticate {
            return Err(AppError::ServiceUnavailable(
                "mock identity provider is down".to_string(),
            ));
        }
        if state.authenticate_failures_remaining > 0 {
            state.authenticate_failures_remaining -= 1;
            return Err(AppError::ServiceUnavailable(
                "mock identity provider not ready".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientRepresentation>> {
        Ok(self
            .state
            .lock()
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }

    async fn list_protocol_mappers(&self, client_uuid: &str) -> Result<Vec<ProtocolMapper>> {
        Ok(self
            .state
            .lock()
            .protocol_mappers
            .get(client_uuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_protocol_mapper(&self, client_uuid: &str, mapper: &ProtocolMapper) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_add_mapper.as_deref() == Some(mapper.name.as_str()) {
            return Err(AppError::ServiceUnavailable(format!(
                "mock failure adding mapper '{}'",
                mapper.name
            )));
        }
        state.mappers_added.push(mapper.name.clone());
        state
            .protocol_mappers
            .entry(client_uuid.to_string())
            .or_default()
            .push(mapper.clone());
        Ok(())
    }

    async fn find_realm_role(&self, name: &str) -> Result<Option<RoleRepresentation>> {
        Ok(self.state.lock().realm_roles.get(name).cloned())
    }

    async fn create_realm_role(&self, name: &str, description: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_create_role.as_deref() == Some(name) {
            return Err(AppError::ServiceUnavailable(format!(
                "mock failure creating role '{}'",
                name
            )));
        }
        state.realm_roles_created.push(name.to_string());
        state.realm_roles.insert(
            name.to_string(),
            RoleRepresentation {
                id: format!("role-{}", name),
                name: name.to_string(),
                description: Some(description.to_string()),
            },
        );
        Ok(())
    }

    async fn find_client_role(
        &self,
        client_uuid: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>> {
        Ok(self
            .state
            .lock()
            .client_roles
            .get(client_uuid)
            .and_then(|roles| roles.get(name))
            .cloned())
    }

    async fn create_client_role(
        &self,
        client_uuid: &str,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_create_role.as_deref() == Some(name) {
            return Err(AppError::ServiceUnavailable(format!(
                "mock failure creating role '{}'",
                name
            )));
        }
        state.client_roles_created.push(name.to_string());
        state
            .client_roles
            .entry(client_uuid.to_string())
            .or_default()
            .insert(
                name.to_string(),
                RoleRepresentation {
                    id: format!("client-role-{}", name),
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
            );
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRepresentation>> {
        Ok(self.state.lock().users.get(username).cloned())
    }

    async fn assign_realm_roles(&self, user_id: &str, roles: &[RoleRepresentation]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_assign_roles {
            return Err(AppError::ServiceUnavailable(
                "mock role assignment failure".to_string(),
            ));
        }
        state
            .assigned_roles
            .entry(user_id.to_string())
            .or_default()
            .extend(roles.iter().map(|r| r.name.clone()));
        Ok(())
    }
}
