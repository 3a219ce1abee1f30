pub mod credentials;
pub mod crypto;
pub mod identity;
pub mod orchestrator;
pub mod readiness;
pub mod seeding;

pub use credentials::CredentialService;
pub use crypto::FieldCipher;
pub use identity::{IdentityAdmin, KeycloakAdminClient};
pub use orchestrator::BootstrapOrchestrator;
pub use readiness::ReadinessProbe;
pub use seeding::SeedingService;
