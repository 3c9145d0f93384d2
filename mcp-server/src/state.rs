//! Process-wide handles the tool dispatcher shares across every call: the
//! Orchestrator, the Tournament Scheduler, the Session Manager, and the
//! Secure Reader, all built once at startup from [`GatewayConfig`].

use std::sync::Arc;

use reasoning_core::GatewayConfig;
use reasoning_core::Orchestrator;
use reasoning_core::SecureReader;
use reasoning_core::SessionManager;
use reasoning_core::TournamentScheduler;
use reasoning_core::adapter::ChatFactory;
use reasoning_core::adapter::gemini::GeminiChatFactory;

pub struct GatewayState {
    pub config: GatewayConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub tournament: Arc<TournamentScheduler>,
    pub reader: Arc<SecureReader>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        let reader = Arc::new(SecureReader::new(config.project_root.clone()));
        let factory: Arc<dyn ChatFactory> = Arc::new(GeminiChatFactory::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
        ));
        let sessions = SessionManager::new();

        let orchestrator = Arc::new(Orchestrator::new(sessions, factory.clone(), reader.clone()));
        let tournament = Arc::new(TournamentScheduler::new(factory, reader.clone()));

        Self {
            config,
            orchestrator,
            tournament,
            reader,
        }
    }
}
