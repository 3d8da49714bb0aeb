pub mod config;
pub mod delivery;
pub mod error;
pub mod layout;
pub mod mailer;
pub mod models;
pub mod pdf;
pub mod reports;
pub mod routes;
pub mod service;
pub mod storage;
pub mod store;

use std::sync::Arc;

use crate::{
    delivery::DeliveryQueue,
    mailer::Mailer,
    pdf::{CertificateRenderer, FallbackRenderer},
    reports::ReportLog,
    routes::AppState,
    service::CertificateService,
    storage::{ArtifactStore, FsArtifactStore},
    store::Registry,
};

/// Wires every component from `config`. Must run inside a tokio runtime (spawns the delivery worker).
pub fn build_state(config: &config::Config, mailer: Arc<dyn Mailer>) -> AppState {
    let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(config.media_root.clone()));
    let reports = Arc::new(ReportLog::new());
    let queue = DeliveryQueue::start(config.queue_capacity, config.status_retention, mailer, store.clone(), reports.clone());
    let service = CertificateService::new(
        Arc::new(Registry::new()),
        reports,
        CertificateRenderer::new(store.clone(), config.assets_root.clone()),
        FallbackRenderer::new(store),
        queue,
    );
    AppState { service: Arc::new(service) }
}
