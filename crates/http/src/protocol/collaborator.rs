//! Optional collaborators a handler can reach through its [`Request`](crate::protocol::Request).
//!
//! The server core never calls these itself. They are injected once when the
//! server is built and shared by every request; using one that was not injected
//! fails with [`CollaboratorError::NotInjected`].

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::runtime::Handle;

use crate::protocol::CollaboratorError;

/// Renders a named template against a JSON context.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, CollaboratorError>;
}

/// Accepts background work that must outlive the request that produced it.
pub trait TaskSubmitter: Send + Sync {
    fn submit(&self, task: BoxFuture<'static, ()>) -> Result<(), CollaboratorError>;
}

/// A [`TaskSubmitter`] spawning onto the tokio runtime of the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTaskSubmitter;

impl TaskSubmitter for TokioTaskSubmitter {
    fn submit(&self, task: BoxFuture<'static, ()>) -> Result<(), CollaboratorError> {
        let handle = Handle::try_current().map_err(CollaboratorError::rejected)?;
        handle.spawn(task);
        Ok(())
    }
}

/// The set of injected collaborators, cheap to clone into every request.
#[derive(Clone, Default)]
pub struct Collaborators {
    template_engine: Option<Arc<dyn TemplateEngine>>,
    task_submitter: Option<Arc<dyn TaskSubmitter>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_template_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.template_engine = Some(Arc::new(engine));
        self
    }

    #[must_use]
    pub fn with_task_submitter(mut self, submitter: impl TaskSubmitter + 'static) -> Self {
        self.task_submitter = Some(Arc::new(submitter));
        self
    }

    pub fn template_engine(&self) -> Result<&dyn TemplateEngine, CollaboratorError> {
        self.template_engine.as_deref().ok_or(CollaboratorError::NotInjected("template engine"))
    }

    pub fn task_submitter(&self) -> Result<&dyn TaskSubmitter, CollaboratorError> {
        self.task_submitter.as_deref().ok_or(CollaboratorError::NotInjected("task submitter"))
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("template_engine", &self.template_engine.is_some())
            .field("task_submitter", &self.task_submitter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn missing_collaborators() {
        let collaborators = Collaborators::new();

        assert!(matches!(collaborators.template_engine(), Err(CollaboratorError::NotInjected("template engine"))));
        assert!(matches!(collaborators.task_submitter(), Err(CollaboratorError::NotInjected("task submitter"))));
    }

    #[test]
    fn tokio_submitter_outside_runtime() {
        let result = TokioTaskSubmitter.submit(Box::pin(async {}));
        assert!(matches!(result, Err(CollaboratorError::Rejected { .. })));
    }

    #[tokio::test]
    async fn tokio_submitter_runs_task() {
        let done = Arc::new(AtomicBool::new(false));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let flag = done.clone();
        TokioTaskSubmitter
            .submit(Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(());
            }))
            .unwrap();

        rx.await.unwrap();
        assert!(done.load(Ordering::SeqCst));
    }
}
