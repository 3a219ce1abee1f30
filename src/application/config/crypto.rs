use std::env;

#[derive(Debug, Clone)]
pub struct CryptoConfig {
    /// Secret used to derive the AES key for credential field encryption.
    pub credential_secret: String,
}

impl CryptoConfig {
    pub fn from_env() -> Self {
        Self {
            credential_secret: env::var("PAYADMIN_CREDENTIAL_SECRET").unwrap_or_else(|_| {
                tracing::warn!(
                    "PAYADMIN_CREDENTIAL_SECRET not set, using development default"
                );
                "payadmin-dev-credential-secret".to_string()
            }),
        }
    }
}
