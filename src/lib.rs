use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer, Responder};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod batch;
pub mod config;
pub mod layout;
pub mod notify;
pub mod pdf;
pub mod record;
pub mod summary;
pub mod upload;
pub mod whatsapp;

use crate::batch::{BatchDriver, Throttle};
use crate::config::{AppConfig, NotifyChannel, RunMode};
use crate::layout::TemplateLayout;
use crate::notify::{LogNotifier, Notifier, WhatsAppNotifier};
use crate::pdf::PdfFormFiller;
use crate::whatsapp::{MediaUploader, WhatsAppClient};

/// Body of every non-success response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub uploader: Arc<dyn MediaUploader + Send + Sync>,
}

impl AppState {
    pub fn new(uploader: Arc<dyn MediaUploader + Send + Sync>) -> Self {
        Self { uploader }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::upload::handlers::upload_media, health),
    components(schemas(
        whatsapp::MediaUploadResult,
        upload::UploadMediaRequest,
        MessageResponse,
    )),
    tags(
        (name = "Media Service", description = "Relay PDFs to the messaging provider."),
        (name = "Health", description = "Liveness probe.")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Server is running"))
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Register the application routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload").route(web::post().to(upload::upload_media)))
        .service(web::resource("/health").route(web::get().to(health)));
}

/// Pick the notification channel named in the configuration.
pub fn build_notifier(
    config: &AppConfig,
    client: Arc<WhatsAppClient>,
) -> Box<dyn Notifier + Send + Sync> {
    match config.notify.channel {
        NotifyChannel::Log => Box::new(LogNotifier),
        NotifyChannel::WhatsApp => Box::new(WhatsAppNotifier::new(
            client,
            config.notify.recipient.clone(),
            config.notify.attach_document,
        )),
    }
}

pub fn build_batch_driver(
    config: &AppConfig,
    layout: Arc<TemplateLayout>,
    client: Arc<WhatsAppClient>,
) -> BatchDriver {
    let filler = PdfFormFiller::new(
        config.batch.template_pdf.clone(),
        config.batch.output_dir.clone(),
        layout,
    );
    log::info!(
        "Filling {} into {}",
        config.batch.template_pdf.display(),
        filler.output_dir().display()
    );
    BatchDriver::new(
        Box::new(filler),
        build_notifier(config, client),
        Throttle::fixed(config.batch.notify_delay),
    )
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(csv_path) = std::env::args().nth(1) {
        config.batch.input_csv = csv_path.into();
    }

    let layout = TemplateLayout::load(config.batch.layout_file.as_deref())
        .context("failed to load template layout")?;

    let http_client = reqwest::Client::builder()
        .user_agent("ecd-report-server/0.1")
        .build()
        .context("failed to create HTTP client")?;
    let whatsapp = Arc::new(WhatsAppClient::new(http_client, config.whatsapp.clone()));

    let driver = build_batch_driver(&config, Arc::new(layout), whatsapp.clone());
    let input_csv = config.batch.input_csv.clone();

    match config.mode {
        RunMode::Batch => {
            driver.run(&input_csv).await;
            Ok(())
        }
        RunMode::Serve => {
            actix_web::rt::spawn(async move {
                driver.run(&input_csv).await;
            });
            serve(&config, whatsapp).await
        }
    }
}

async fn serve(config: &AppConfig, uploader: Arc<WhatsAppClient>) -> anyhow::Result<()> {
    if config.whatsapp.token.is_empty() {
        log::warn!("WHATSAPP_TOKEN is not set, media uploads will be rejected by the provider");
    }

    let app_state = web::Data::new(AppState::new(uploader));
    let prometheus = PrometheusMetricsBuilder::new("ecd_report_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow!("Failed to create Prometheus metrics middleware: {:?}", e))?;
    let origins = config.server.cors_allowed_origins.clone();

    let (host, port) = config.bind_address();
    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = if origins.is_empty() {
            Cors::permissive()
        } else {
            origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
