use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use styletry_tryon::config::AppConfig;
use styletry_tryon::controller::{TryOnController, TryOnState};
use styletry_tryon::models::history::ProductRef;
use styletry_tryon::models::job::TryOnRequest;
use styletry_tryon::services::audit::JsonlPathAudit;
use styletry_tryon::services::backend::HttpTryOnBackend;
use styletry_tryon::services::history::{HistoryRecorder, NullHistoryRecorder, RestHistoryRecorder};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    // Register application metrics
    metrics::describe_counter!("tryon_jobs_submitted_total", "Total try-on jobs submitted");
    metrics::describe_counter!("tryon_jobs_completed_total", "Total try-on jobs completed");
    metrics::describe_counter!("tryon_jobs_failed_total", "Total try-on jobs that failed");
    metrics::describe_counter!("tryon_poll_ticks_total", "Total poll ticks across all sessions");
    metrics::describe_counter!(
        "tryon_poll_transient_errors_total",
        "Status checks that failed at the transport layer"
    );

    let mut args = std::env::args().skip(1);
    let (photo_path, garment_url, category_id) = match (args.next(), args.next(), args.next()) {
        (Some(photo), Some(garment), Some(category)) => (photo, garment, category),
        _ => {
            eprintln!("Usage: styletry-tryon <photo-path> <garment-image-url> <category-id> [product-name]");
            std::process::exit(2);
        }
    };
    let product_name = args.next().unwrap_or_else(|| "ad-hoc garment".to_string());

    let user_photo = tokio::fs::read(&photo_path)
        .await
        .expect("Failed to read photo file");

    tracing::info!(
        photo = %photo_path,
        garment_url = %garment_url,
        category = %category_id,
        "Starting try-on"
    );

    let backend = Arc::new(
        HttpTryOnBackend::new(&config.tryon_api_base_url)
            .expect("Failed to initialize try-on service client"),
    );

    let history: Arc<dyn HistoryRecorder> = match &config.history_endpoint {
        Some(endpoint) => Arc::new(
            RestHistoryRecorder::new(endpoint.clone(), config.history_api_key.clone())
                .expect("Failed to initialize history recorder"),
        ),
        None => Arc::new(NullHistoryRecorder),
    };

    let audit = Arc::new(JsonlPathAudit::new(&config.audit_path));

    let controller = TryOnController::with_limits(
        backend,
        history,
        audit,
        config.max_poll_attempts,
        std::time::Duration::from_millis(config.poll_interval_ms),
    );
    let mut state_rx = controller.subscribe();

    let request = TryOnRequest {
        user_photo,
        garment_image_url: garment_url.clone(),
        category_id: category_id.clone(),
    };
    let product = ProductRef {
        id: Uuid::new_v4().to_string(),
        name: product_name,
        image: garment_url,
    };
    controller.start(request, product);

    loop {
        if state_rx.changed().await.is_err() {
            tracing::error!("Controller state channel closed unexpectedly");
            std::process::exit(1);
        }
        let state = state_rx.borrow_and_update().clone();
        match state {
            TryOnState::Polling { progress } => {
                tracing::info!(progress, "Processing try-on request");
            }
            TryOnState::Succeeded(success) => {
                tracing::info!(result = %success.result_image_url, "Try-on complete");
                println!("{}", success.result_image_url);
                return;
            }
            TryOnState::Failed { detail } => {
                tracing::error!(detail = %detail, "Try-on failed");
                eprintln!("try-on failed: {detail}");
                std::process::exit(1);
            }
            TryOnState::Idle | TryOnState::Submitting => {}
        }
    }
}
