use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use ecoscan::analytics::{AnalyticsSummary, InMemoryAnalytics};
use ecoscan::catalog::{placeholder_url, StaticCatalog};
use ecoscan::config::AppConfig;
use ecoscan::error::{AppError, UploadError};
use ecoscan::scan::{ScanPipeline, ScanResult};
use ecoscan::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ScanPipeline>,
    analytics: Arc<InMemoryAnalytics>,
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "EcoScan",
    about = "Scan product label photos into sustainability scores and greener alternatives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Decode and score a single label photo from disk
    Scan(ScanArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Path to the label photo
    #[arg(long)]
    image: PathBuf,
    /// Caller identity recorded in the analytics log
    #[arg(long, default_value = "cli")]
    caller: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Scan(args) => run_scan_file(args),
    }
}

fn build_pipeline(analytics: Arc<InMemoryAnalytics>) -> Arc<ScanPipeline> {
    Arc::new(ScanPipeline::new(
        Arc::new(StaticCatalog::standard()),
        analytics,
    ))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let analytics = Arc::new(InMemoryAnalytics::new());
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        pipeline: build_pipeline(analytics.clone()),
        analytics,
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = router(state)
        .layer(prometheus_layer)
        .layer(DefaultBodyLimit::max(config.uploads.max_image_bytes));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "label scanning service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/scan", post(scan_endpoint))
        .route("/api/v1/stats", get(stats_endpoint))
        .route("/api/placeholder/:width/:height", get(placeholder_endpoint))
        .with_state(state)
}

fn run_scan_file(args: ScanArgs) -> Result<(), AppError> {
    let image = std::fs::read(&args.image)?;
    let pipeline = build_pipeline(Arc::new(InMemoryAnalytics::new()));
    let result = pipeline.scan(&image, &args.caller)?;
    render_scan_result(&result);
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn scan_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ScanResult>, AppError> {
    let caller = caller_identity(&headers);
    let image = read_image_field(multipart).await?;
    let result = state.pipeline.scan(&image, &caller)?;
    Ok(Json(result))
}

async fn stats_endpoint(State(state): State<AppState>) -> Json<AnalyticsSummary> {
    Json(state.analytics.summary())
}

async fn placeholder_endpoint(Path((width, height)): Path<(u32, u32)>) -> String {
    placeholder_url(width, height)
}

/// Pull the uploaded image out of the multipart body, checking only that
/// the filename maps to a raster type. Content validation happens in the
/// decoder.
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Unreadable(err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime = mime_guess::from_path(&filename).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(UploadError::UnsupportedType { filename });
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| UploadError::Unreadable(err.to_string()))?;
        return Ok(bytes.to_vec());
    }
    Err(UploadError::MissingImage)
}

/// Proxy-aware caller identity: first hop of `x-forwarded-for`, else a
/// fixed local marker.
fn caller_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn render_scan_result(result: &ScanResult) {
    let product = &result.product;
    println!("Scanned barcode {}", result.barcode);
    println!(
        "{} ({}) - {}",
        product.product.name, product.product.category, product.product.price
    );
    println!(
        "EcoScore {}/5 | packaging {} | carbon footprint {}",
        product.ecoscore,
        product.packaging.label(),
        product.carbon_footprint.label()
    );

    println!("\nSustainability tips");
    for tip in &product.sustainability_tips {
        println!("- {tip}");
    }

    println!("\nGreener alternatives");
    for alternative in &result.alternatives {
        println!(
            "- {} (EcoScore {}/5, {}): {}",
            alternative.name, alternative.ecoscore, alternative.price, alternative.improvement
        );
    }
}
