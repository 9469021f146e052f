use std::sync::Arc;

use acquisition::{build_source, select_variables, FetchOptions, SourceConfig};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::post,
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::{info, warn};
use nasa_weather_core::Credentials;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    bridge_logger, chat_weather, generate_csv, models, predict_weather, routes, simple_chat,
    ChatCompletion, Cli, OpenAiClient, OrchestratorWeatherService, WeatherService,
};

#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<dyn WeatherService>,
    pub chat: Arc<dyn ChatCompletion>,
    /// Year whose data stands in for the requested calendar day
    pub reference_year: i32,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::predict::predict_weather,
        routes::chat::chat_weather,
        routes::chat::simple_chat,
        routes::csv::generate_csv,
    ),
    components(
        schemas(
            models::Time,
            models::Location,
            models::WeatherPredictionRequest,
            models::ChatRequest,
            models::ChatResponse,
            models::ChatLocation,
            models::SimpleChatRequest,
            models::SimpleChatResponse,
            models::WeatherData,
            models::CsvRequest,
        )
    ),
    tags(
        (name = "nasa weather api", description = "Weather summaries from NASA Earthdata, LLM forecasts and CSV exports")
    )
)]
struct ApiDoc;

pub fn build_app_state(cli: &Cli) -> Result<AppState, anyhow::Error> {
    let credentials = Credentials::resolve(cli.username.clone(), cli.password.clone())
        .map_err(|e| anyhow!("error resolving Earthdata credentials: {}", e))?;
    let variables = select_variables(&cli.variables)?;

    let config = SourceConfig {
        credentials,
        endpoints: cli.endpoints(),
        user_agent: cli.user_agent(),
        request_timeout: cli.request_timeout(),
        max_files: cli.max_files(),
    };
    let source = build_source(cli.backend(), config, bridge_logger())?;
    let options = FetchOptions {
        max_workers: None,
        task_timeout: cli.task_timeout(),
    };
    let weather = Arc::new(OrchestratorWeatherService::new(source, options, variables));

    let api_key = cli.openai_api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        warn!("no OPENAI_API_KEY set, chat completions will be rejected upstream");
    }
    let chat = OpenAiClient::new(
        api_key,
        &cli.openai_base_url(),
        &cli.models,
        cli.request_timeout(),
    )
    .map_err(|e| anyhow!("error setting up chat client: {}", e))?;
    info!("  Models: {}", chat.models().join(", "));

    Ok(AppState {
        weather,
        chat: Arc::new(chat),
        reference_year: cli.reference_year(),
    })
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/predict/weather", post(predict_weather))
        .route("/predict/weather/", post(predict_weather))
        .route("/chat/weather", post(chat_weather))
        .route("/chat/weather/", post(chat_weather))
        .route("/chat/simple", post(simple_chat))
        .route("/chat/simple/", post(simple_chat))
        .route("/csv/generate", post(generate_csv))
        .route("/csv/generate/", post(generate_csv))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
