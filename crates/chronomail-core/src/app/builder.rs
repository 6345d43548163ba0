//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! Fail-fast: configuration is validated in `build()`, so a bad interval or
//! retry ceiling is reported at startup instead of on the first cycle.

use std::sync::Arc;

use crate::config::{ConfigError, DispatcherConfig};
use crate::impls::InMemoryScheduleStore;
use crate::ports::{Clock, MailTransport, ScheduleStore, SystemClock};

use super::{Dispatcher, ScheduleService};

/// Builds the service and the dispatcher on top of one shared store.
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(transport)
///     .store(store)
///     .dispatcher_config(config.dispatcher)
///     .build()?;
/// let handle = app.dispatcher.clone().spawn();
/// ```
pub struct AppBuilder {
    transport: Arc<dyn MailTransport>,
    store: Option<Arc<dyn ScheduleStore>>,
    clock: Arc<dyn Clock>,
    dispatcher: DispatcherConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    /// Defaults: system clock, memory-only store, default dispatcher config.
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self {
            transport,
            store: None,
            clock: Arc::new(SystemClock),
            dispatcher: DispatcherConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn ScheduleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Clock used by the dispatcher and by the default store.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher = config;
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.dispatcher.validate()?;

        let clock = Arc::clone(&self.clock);
        let store = self.store.unwrap_or_else(|| -> Arc<dyn ScheduleStore> {
            Arc::new(InMemoryScheduleStore::new(clock))
        });
        let service = ScheduleService::new(Arc::clone(&store), Arc::clone(&self.transport));
        let dispatcher = Dispatcher::new(store, self.transport, self.clock, &self.dispatcher);

        Ok(App {
            service: Arc::new(service),
            dispatcher: Arc::new(dispatcher),
        })
    }
}

/// Wired application. The service is handed to API layers; the dispatcher
/// stays with the process owner, who spawns it and keeps the handle.
pub struct App {
    pub service: Arc<ScheduleService>,
    pub dispatcher: Arc<Dispatcher>,
}
