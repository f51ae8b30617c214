use std::future::Future;
use std::sync::Arc;

use tokio_util::task::TaskTracker;

use stylist_llm::{TitleGenerator, TitleOptions};
use stylist_persist::SessionStore;
use stylist_types::MessageEntry;

/// Work that outlives the request that scheduled it.
///
/// Tasks are tracked so that graceful shutdown can wait for them; their
/// failures are logged and never retried.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, T>(&self, name: &'static str, task: F)
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "Background task failed");
            }
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Close the tracker and wait for every task spawned so far
    pub async fn shutdown(&self) {
        self.tracker.close();
        tracing::info!(pending = self.tracker.len(), "Draining background tasks");
        self.tracker.wait().await;
    }
}

/// Generate a title for a fresh session and store it.
///
/// Returns the stored title, or `None` when the generator produced nothing.
pub async fn assign_generated_title(
    store: Arc<dyn SessionStore>,
    generator: Arc<TitleGenerator>,
    session_id: String,
    messages: Vec<MessageEntry>,
    options: TitleOptions,
) -> anyhow::Result<Option<String>> {
    let Some(title) = generator.generate(&messages, &options).await else {
        tracing::debug!(session_id = %session_id, "No title generated, keeping default");
        return Ok(None);
    };

    store.update_session_title(&session_id, &title).await?;
    tracing::info!(session_id = %session_id, title = %title, "Session title assigned");

    Ok(Some(title))
}
