use crate::common::{ImageLoader, LoadedImage};
use crate::config::Configuration;
use crate::error::AppError;
use crate::intake::AnalysisRequest;
use crate::pipeline::domain::{AnalyzerResult, EnsembleResult, Finding, Sector};
use crate::pipeline::orchestration::service::{AnalyzerService, FailSoftLayer};
use crate::pipeline::services::analysis::{
    ElaAnalyzer, ForensicAnalyzer, GanDetectionAnalyzer, MetadataAnalyzer, NoiseResidualAnalyzer,
    VisualConsistencyAnalyzer,
};
use crate::pipeline::services::learned::LearnedSignalProvider;
use futures::Future;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{info, instrument};

/// One sector of the breakdown, already wrapped so it cannot fail.
pub type SectorService = BoxCloneSyncService<Arc<LoadedImage>, AnalyzerResult, Infallible>;

/// Decode, fan out to the five analyzers, aggregate.
#[derive(Clone)]
pub struct ForensicService {
    loader: ImageLoader,
    metadata: SectorService,
    ela: SectorService,
    noise: SectorService,
    gan: SectorService,
    visual: SectorService,
}

impl ForensicService {
    pub fn builder(provider: Arc<dyn LearnedSignalProvider>) -> ForensicServiceBuilder {
        ForensicServiceBuilder::new(provider)
    }

    /// Runs all five analyzers on an already decoded image.
    pub async fn score(&self, image: Arc<LoadedImage>) -> EnsembleResult {
        let (metadata, ela, noise, gan, visual) = futures::join!(
            self.metadata.clone().oneshot(image.clone()),
            self.ela.clone().oneshot(image.clone()),
            self.noise.clone().oneshot(image.clone()),
            self.gan.clone().oneshot(image.clone()),
            self.visual.clone().oneshot(image),
        );

        EnsembleResult::aggregate([
            settle(metadata),
            settle(ela),
            settle(noise),
            settle(gan),
            settle(visual),
        ])
    }

    #[instrument(skip_all, fields(request_id = %request.request_id(), bytes = request.len()))]
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<EnsembleResult, AppError> {
        let start = Instant::now();
        let (request_id, bytes) = request.into_parts();
        let loader = self.loader;

        // Undecodable input stops here; no analyzer sees it.
        let image = tokio::task::spawn_blocking(move || loader.load(request_id, bytes))
            .await
            .map_err(|e| AppError::Pipeline(format!("decode task failed: {e}")))??;

        let verdict = self.score(Arc::new(image)).await;

        info!(
            ensemble_score = verdict.ensemble_score,
            label = ?verdict.overall_label,
            duration_ms = start.elapsed().as_millis() as u64,
            "Verdict ready"
        );
        Ok(verdict)
    }
}

fn settle(result: Result<AnalyzerResult, Infallible>) -> AnalyzerResult {
    match result {
        Ok(result) => result,
        Err(never) => match never {},
    }
}

impl Service<AnalysisRequest> for ForensicService {
    type Response = EnsembleResult;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: AnalysisRequest) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.analyze(request).await })
    }
}

pub struct ForensicServiceBuilder {
    provider: Arc<dyn LearnedSignalProvider>,
    inference_timeout: Option<Duration>,
    inference_concurrency: Option<usize>,
}

impl ForensicServiceBuilder {
    pub fn new(provider: Arc<dyn LearnedSignalProvider>) -> Self {
        Self {
            provider,
            inference_timeout: None,
            inference_concurrency: None,
        }
    }

    pub fn from_configuration(
        configuration: &Configuration,
        provider: Arc<dyn LearnedSignalProvider>,
    ) -> Self {
        Self::new(provider)
            .inference_timeout(configuration.inference.timeout())
            .inference_concurrency(configuration.inference.effective_concurrency())
    }

    // Bounds the learned-model step, including time spent waiting for a slot.
    pub fn inference_timeout(mut self, inference_timeout: Duration) -> Self {
        self.inference_timeout = Some(inference_timeout);
        self
    }

    // Caps how many inferences run at once across clones of the service. Match it
    // to the number of sessions the provider can serve in parallel.
    pub fn inference_concurrency(mut self, inference_concurrency: usize) -> Self {
        self.inference_concurrency = Some(inference_concurrency.max(1));
        self
    }

    pub fn build(self) -> ForensicService {
        let mut inference = AnalyzerService::new(Box::new(GanDetectionAnalyzer::new(self.provider)));
        if let Some(limit) = self.inference_concurrency {
            inference = inference.with_concurrency_limit(limit);
        }
        let gan = ServiceBuilder::new()
            .layer(FailSoftLayer::new(Sector::GanDetection))
            .option_layer(self.inference_timeout.map(TimeoutLayer::new))
            .service(inference);

        ForensicService {
            loader: ImageLoader::new(),
            metadata: heuristic(MetadataAnalyzer::new()),
            ela: heuristic(ElaAnalyzer::new()),
            noise: heuristic(NoiseResidualAnalyzer::new()),
            gan: BoxCloneSyncService::new(gan),
            visual: heuristic(VisualConsistencyAnalyzer::new()),
        }
    }
}

fn heuristic<A: ForensicAnalyzer + 'static>(analyzer: A) -> SectorService {
    let service = AnalyzerService::new(Box::new(analyzer));
    boxed(service.sector(), service)
}

fn boxed<S>(sector: Sector, service: S) -> SectorService
where
    S: Service<Arc<LoadedImage>, Response = Finding> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(ServiceBuilder::new().layer(FailSoftLayer::new(sector)).service(service))
}
