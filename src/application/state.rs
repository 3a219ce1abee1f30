use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::credentials::CredentialService;
use crate::services::identity::IdentityAdmin;
use crate::services::orchestrator::BootstrapOrchestrator;
use crate::services::readiness::ReadinessProbe;
use crate::services::seeding::SeedingService;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources. The orchestrator is
/// constructed exactly once here; `run()` and `run_step()` are its only
/// mutating entry points.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub credentials: CredentialService,
    pub orchestrator: Arc<BootstrapOrchestrator>,
}

impl AppState {
    pub fn new(db: DbConn, identity: Arc<dyn IdentityAdmin>) -> Self {
        let seeding = SeedingService::from_config(db.clone(), identity);
        let orchestrator = Arc::new(BootstrapOrchestrator::new(
            seeding,
            ReadinessProbe::from_config(),
        ));

        Self {
            db: db.clone(),
            credentials: CredentialService::from_config(db),
            orchestrator,
        }
    }
}
