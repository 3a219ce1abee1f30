use std::env;

/// Identity provider (Keycloak) connection and bootstrap settings
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub realm: String,
    pub admin_username: String,
    pub admin_password: String,
    /// Client-id of the application client that receives claim mappers
    /// and client-scoped roles.
    pub client_id: String,
    /// Username of the account that gets the admin realm roles at bootstrap.
    /// Absence is a warning, not an error.
    pub privileged_account: Option<String>,
    pub probe_max_attempts: u32,
    pub probe_delay_ms: u64,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("PAYADMIN_KEYCLOAK_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            realm: env::var("PAYADMIN_KEYCLOAK_REALM").unwrap_or_else(|_| "payadmin".to_string()),
            admin_username: env::var("PAYADMIN_KEYCLOAK_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("PAYADMIN_KEYCLOAK_ADMIN_PASSWORD").unwrap_or_default(),
            client_id: env::var("PAYADMIN_KEYCLOAK_CLIENT_ID")
                .unwrap_or_else(|_| "payadmin-web".to_string()),
            privileged_account: env::var("PAYADMIN_PRIVILEGED_ACCOUNT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            probe_max_attempts: env::var("PAYADMIN_PROBE_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            probe_delay_ms: env::var("PAYADMIN_PROBE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}
