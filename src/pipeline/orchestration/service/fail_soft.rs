use crate::common::LoadedImage;
use crate::pipeline::domain::{AnalyzerResult, Finding, Sector};
use futures::Future;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{BoxError, Service, ServiceExt};
use tower_layer::Layer;
use tracing::{debug, warn};

/// Wraps an analyzer service so it can never fail: errors, timeouts and
/// panics all become the sector's degraded result.
#[derive(Clone)]
pub struct FailSoft<S> {
    inner: S,
    sector: Sector,
}

impl<S> FailSoft<S> {
    pub fn new(inner: S, sector: Sector) -> Self {
        Self { inner, sector }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Service<Arc<LoadedImage>> for FailSoft<S>
where
    S: Service<Arc<LoadedImage>, Response = Finding> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    type Response = AnalyzerResult;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    // Readiness of the inner service is driven per call through `oneshot`.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: Arc<LoadedImage>) -> Self::Future {
        let sector = self.sector;
        let inner = self.inner.clone();

        Box::pin(async move {
            let start = Instant::now();
            let request_id = image.request_id();

            let result = match inner.oneshot(image).await {
                Ok(finding) => AnalyzerResult::from_finding(sector, finding),
                Err(e) => {
                    let e: BoxError = e.into();
                    warn!(%request_id, %sector, error = %e, "Analyzer degraded");
                    AnalyzerResult::degraded(sector, &e)
                }
            };

            debug!(
                %request_id,
                %sector,
                score = result.score,
                duration_us = start.elapsed().as_micros() as u64,
                "Analyzer finished"
            );
            Ok(result)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FailSoftLayer {
    sector: Sector,
}

impl FailSoftLayer {
    pub fn new(sector: Sector) -> Self {
        Self { sector }
    }
}

impl<S> Layer<S> for FailSoftLayer {
    type Service = FailSoft<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FailSoft::new(inner, self.sector)
    }
}
