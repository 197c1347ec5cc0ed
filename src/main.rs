use image_authenticity::common::ImageLoader;
use image_authenticity::config::Configuration;
use image_authenticity::error::AppError;
use image_authenticity::intake::{AnalysisRequest, AnalysisResponse};
use image_authenticity::pipeline::services::analysis::ElaAnalyzer;
use image_authenticity::pipeline::services::learned::{
    LearnedSignalProvider, OnnxClassifier, UnavailableProvider,
};
use image_authenticity::pipeline::{ForensicService, ForensicServiceBuilder};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_provider(configuration: &Configuration) -> Result<Arc<dyn LearnedSignalProvider>, AppError> {
    match &configuration.model.path {
        Some(path) => {
            let classifier = OnnxClassifier::load(
                path,
                configuration.model.input_size,
                configuration.model.intra_threads,
                configuration.inference.effective_concurrency(),
            )?;
            tracing::info!(model = %path.display(), "Learned model loaded");
            Ok(Arc::new(classifier))
        }
        None => {
            tracing::warn!("No model path configured, GAN detection will report a neutral score");
            Ok(Arc::new(UnavailableProvider))
        }
    }
}

async fn write_ela_map(bytes: Vec<u8>, source: &Path, ela_dir: &Path) -> Result<PathBuf, AppError> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let target = ela_dir.join(format!("{stem}.ela.png"));
    let destination = target.clone();

    tokio::task::spawn_blocking(move || -> Result<(), AppError> {
        let image = ImageLoader::new().load(uuid::Uuid::new_v4(), bytes)?;
        let level = ElaAnalyzer::new()
            .error_level(image.rgb())
            .map_err(|e| AppError::Pipeline(format!("error level pass failed: {e}")))?;
        std::fs::create_dir_all(destination.parent().unwrap_or(Path::new(".")))?;
        level
            .residual_map
            .save(&destination)
            .map_err(|e| AppError::Pipeline(format!("failed to write residual map: {e}")))
    })
    .await
    .map_err(|e| AppError::Pipeline(format!("residual map task failed: {e}")))??;

    Ok(target)
}

async fn analyze_file(service: &ForensicService, path: &Path, ela_dir: Option<&Path>) -> bool {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(file = %path.display(), error = %e, "Unable to read file");
            let response = AnalysisResponse::error(&AppError::Io(e));
            println!("{}", response.body);
            return false;
        }
    };

    let keep = ela_dir.map(|_| bytes.clone());
    let result = service.clone().oneshot(AnalysisRequest::new(bytes)).await;
    let response = AnalysisResponse::from_result(result);
    println!("{}", response.body);

    if let (Some(dir), Some(bytes), true) = (ela_dir, keep, response.is_success()) {
        match write_ela_map(bytes, path, dir).await {
            Ok(target) => tracing::info!(map = %target.display(), "Residual map written"),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "Residual map skipped"),
        }
    }

    response.is_success()
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let configuration = Configuration::load()?;
    init_logging(configuration.log_level.parse().unwrap_or(Level::INFO));

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        eprintln!("usage: image-authenticity <image>...");
        println!("{}", AnalysisResponse::error(&AppError::MissingImage).body);
        return Ok(ExitCode::from(2));
    }

    let provider = load_provider(&configuration).inspect_err(|e| {
        tracing::error!(error = %e, "Startup failed");
    })?;
    let service = ForensicServiceBuilder::from_configuration(&configuration, provider).build();
    let ela_dir = configuration.output.ela_dir.as_deref();

    let mut failures = 0;
    for file in &files {
        if !analyze_file(&service, file, ela_dir).await {
            failures += 1;
        }
    }

    if failures > 0 {
        tracing::error!(failures, total = files.len(), "Some files could not be analyzed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
