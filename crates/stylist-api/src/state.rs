use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use stylist_assets::SignedUrlProvider;
use stylist_llm::{LLMClient, PromptBuilder, TitleGenerator, TitleOptions};
use stylist_persist::SessionStore;

use crate::background::BackgroundTasks;
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Every component is built once at startup from the loaded config and
/// shared through `Arc`; nothing here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SessionStore>,
    pub llm_client: Arc<dyn LLMClient>,
    pub assets: Arc<SignedUrlProvider>,
    pub prompt_builder: Arc<PromptBuilder>,
    pub title_generator: Arc<TitleGenerator>,
    pub title_options: TitleOptions,
    pub tasks: BackgroundTasks,
    /// Cancelled on shutdown; live streams hold child tokens
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SessionStore>,
        llm_client: Arc<dyn LLMClient>,
        assets: Arc<SignedUrlProvider>,
    ) -> Self {
        let title_options = config.title_options();

        Self {
            config: Arc::new(config),
            prompt_builder: Arc::new(PromptBuilder::new(assets.clone())),
            title_generator: Arc::new(TitleGenerator::new(llm_client.clone())),
            title_options,
            store,
            llm_client,
            assets,
            tasks: BackgroundTasks::new(),
            shutdown: CancellationToken::new(),
        }
    }
}
