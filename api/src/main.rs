use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod approvals;
mod clients;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

use clients::prefs::PrefsClient;
use clients::rag::RagClient;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Profil API",
        version = "0.1.0",
        description = "Profile service for a voice assistant: interview flow, profile completeness, \
                       preference updates and human-in-the-loop approvals."
    ),
    paths(
        routes::health::health_check,
        routes::interview::start_interview,
        routes::interview::answer_interview,
        routes::profile::check_completeness,
        routes::profile::check_completeness_progressive,
        routes::profile::save_insight,
        routes::preferences::call_preferences,
        routes::preferences::update_request,
        routes::approvals::create_approval,
        routes::approvals::resolve_approval,
        routes::approvals::list_pending,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::interview::InterviewStatus,
        routes::interview::InterviewStartRequest,
        routes::interview::InterviewStartResponse,
        routes::interview::InterviewAnswerRequest,
        routes::interview::InterviewAnswerResponse,
        routes::profile::CompletenessRequest,
        routes::profile::CompletenessResponse,
        routes::profile::CategoryProbe,
        routes::profile::ProgressiveCompletenessResponse,
        routes::profile::SaveInsightRequest,
        routes::profile::SaveInsightResponse,
        routes::preferences::PreferencesCallRequest,
        routes::preferences::UpdateRequestBody,
        routes::preferences::UpdateRequestResponse,
        routes::approvals::CreateApprovalRequest,
        routes::approvals::ApprovalOutcomeResponse,
        routes::approvals::ResolveApprovalRequest,
        routes::approvals::ResolveApprovalResponse,
        routes::approvals::PendingApprovalsResponse,
        approvals::ApprovalKind,
        approvals::Decision,
        approvals::Resolution,
        approvals::PendingApproval,
        clients::prefs::PrefsEnvelope,
        profil_core::error::ApiError,
        profil_core::catalog::InterviewState,
        profil_core::catalog::UserPreferenceRecord,
        profil_core::completeness::ProfileScan,
        profil_core::completeness::CompletenessAssessment,
        profil_core::nlu::UpdateDetection,
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profil_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Arc::new(config::Config::from_env());

    let rag = RagClient::new(
        config.rag_base_url.clone(),
        config.rag_timeout,
        config.rag_api_key.clone(),
    )
    .expect("Failed to build RAG client");
    let prefs = PrefsClient::new(
        config.prefs_base_url.clone(),
        config.prefs_timeout,
        config.prefs_api_key.clone(),
    )
    .expect("Failed to build preferences client");

    let approval_store = Arc::new(approvals::ApprovalStore::new(
        config.approval_timeout,
        config.resolution_ttl,
    ));

    let app_state = state::AppState {
        config,
        rag,
        prefs,
        approvals: approval_store,
    };

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::interview::router())
        .merge(routes::profile::router())
        .merge(routes::preferences::router())
        .merge(routes::approvals::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Profil API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
