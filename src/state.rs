use std::sync::Arc;

use registrar_config::{CorsConfig, DatabaseConfig, MatriculeConfig};
use registrar_db::Backend;
use registrar_models::MatriculeGenerated;
use tokio::sync::broadcast;

use crate::events::{BroadcastEventSink, EventBus, EventSink, TracingEventSink};
use crate::modules::matricules::MatriculeService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub matricules: Arc<MatriculeService<Backend>>,
    /// `sink` followed by the live broadcast.
    pub events: Arc<dyn EventSink>,
    pub broadcast: BroadcastEventSink,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(
        matricules: MatriculeService<Backend>,
        sink: Arc<dyn EventSink>,
        cors_config: CorsConfig,
    ) -> Self {
        let broadcast = BroadcastEventSink::default();
        let events = EventBus::new()
            .with_sink(sink)
            .with_sink(Arc::new(broadcast.clone()));

        Self {
            matricules: Arc::new(matricules),
            events: Arc::new(events),
            broadcast,
            cors_config,
        }
    }

    /// Receive every identifier generated from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MatriculeGenerated> {
        self.broadcast.subscribe()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let store = Backend::connect(&DatabaseConfig::from_env()).await?;
    let matricules = MatriculeService::new(store, MatriculeConfig::from_env());

    Ok(AppState::new(
        matricules,
        Arc::new(TracingEventSink),
        CorsConfig::from_env(),
    ))
}
