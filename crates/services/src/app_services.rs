use std::env;
use std::sync::Arc;

use exam_core::stats::TopicRouting;
use storage::repository::Storage;
use tracing::{debug, warn};

use crate::Clock;
use crate::error::{AppServicesError, ConfigError};
use crate::generation::{AiConfig, AiQuestionClient, ExamGenerator, QuestionGenerator};
use crate::history_service::HistoryService;
use crate::sessions::SessionController;

/// Assembles app-facing services from storage and environment configuration.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    generator: ExamGenerator,
    history: HistoryService,
    generation_enabled: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the AI client configured
    /// through the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails, the stored
    /// history cannot be read, or the environment configuration is invalid.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let routing = routing_from_env()?;
        let storage = Storage::sqlite(db_url).await?;
        let config = AiConfig::from_env()?;
        if config.is_none() {
            warn!("EXAM_AI_API_KEY is not set; test generation is disabled");
        }
        let client = AiQuestionClient::new(config);
        let enabled = client.enabled();

        let mut services = Self::from_storage(storage, Arc::new(client), clock).await?;
        services.generation_enabled = enabled;
        services.history = services.history.with_routing(routing);
        Ok(services)
    }

    /// Build services over an existing storage and question source.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the stored history cannot be read.
    pub async fn from_storage(
        storage: Storage,
        source: Arc<dyn QuestionGenerator>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let history = HistoryService::load(Arc::clone(&storage.history)).await?;
        debug!(results = history.history().len(), "app services ready");
        Ok(Self {
            clock,
            generator: ExamGenerator::new(source),
            history,
            generation_enabled: true,
        })
    }

    #[must_use]
    pub fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    #[must_use]
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Hand the services over to a session controller.
    #[must_use]
    pub fn into_session(self) -> SessionController {
        SessionController::new(self.generator, self.history, self.clock)
    }
}

/// Read `EXAM_TOPIC_ROUTING` (`containment`, the default, or `exact`).
fn routing_from_env() -> Result<TopicRouting, ConfigError> {
    env::var("EXAM_TOPIC_ROUTING")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map_or(Ok(TopicRouting::default()), |raw| parse_routing(&raw))
}

fn parse_routing(raw: &str) -> Result<TopicRouting, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "exact" => Ok(TopicRouting::Exact),
        "containment" => Ok(TopicRouting::ExactThenContainment),
        _ => Err(ConfigError::InvalidRouting(raw.to_owned())),
    }
}
