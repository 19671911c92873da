use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::CONFIG;
use crate::services::mail::MailTransport;
use crate::services::{
    JobScheduler, NotificationEngine, NotifySettingsController, RuntimeConfig, SearchService,
};

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub runtime_config: RuntimeConfig,
    pub scheduler: JobScheduler,
    pub mailer: Arc<dyn MailTransport>,
    pub engine: Arc<NotificationEngine>,
    pub notify: NotifySettingsController,
    pub search: SearchService,
}

impl AppState {
    /// Wire the services around one database connection and mail transport
    pub fn new(
        db: DbConn,
        runtime_config: RuntimeConfig,
        mailer: Arc<dyn MailTransport>,
        search: SearchService,
    ) -> Self {
        let scheduler = JobScheduler::new(db.clone());
        let engine = Arc::new(NotificationEngine::new(
            runtime_config.clone(),
            mailer.clone(),
            scheduler.clone(),
            CONFIG.scheduler.failure_policy,
        ));
        let notify = NotifySettingsController::new(
            db.clone(),
            runtime_config.clone(),
            scheduler.clone(),
            mailer.clone(),
            engine.clone(),
        );

        Self {
            db,
            runtime_config,
            scheduler,
            mailer,
            engine,
            notify,
            search,
        }
    }
}
