use std::pin::Pin;
use std::sync::Arc;

use crate::common::LoadedImage;
use crate::pipeline::domain::{Finding, Sector};
use crate::pipeline::services::analysis::ForensicAnalyzer;
use futures::task::Context;
use futures::task::Poll;
use futures::Future;
use tokio::sync::Semaphore;
use tower::BoxError;
use tower::Service;

/// Runs one analyzer on the blocking pool. Errors, including panics inside
/// the analyzer, come back as `BoxError` for the fail-soft layer to absorb.
#[derive(Clone)]
pub struct AnalyzerService {
    inner: Arc<dyn ForensicAnalyzer>,
    slots: Option<Arc<Semaphore>>,
}

impl AnalyzerService {
    pub fn new(inner: Box<dyn ForensicAnalyzer>) -> Self {
        Self {
            inner: Arc::from(inner),
            slots: None,
        }
    }

    /// Caps concurrent runs across clones. A slot is held by the blocking task
    /// itself, so it stays taken after the caller stops waiting.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.slots = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    pub fn sector(&self) -> Sector {
        self.inner.sector()
    }
}

impl Service<Arc<LoadedImage>> for AnalyzerService {
    type Response = Finding;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: Arc<LoadedImage>) -> Self::Future {
        let inner = self.inner.clone();
        let slots = self.slots.clone();

        Box::pin(async move {
            let slot = match slots {
                Some(slots) => Some(slots.acquire_owned().await?),
                None => None,
            };
            let finding = tokio::task::spawn_blocking(move || {
                let _slot = slot;
                inner.analyze(&image)
            })
            .await??;
            Ok(finding)
        })
    }
}
