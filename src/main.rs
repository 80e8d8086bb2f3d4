use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use campus_api::config::AppConfig;
use campus_api::context::{AppContext, SharedContext};
use campus_api::database::manager;
use campus_api::{handlers, storage};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_api=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting campus API in {:?} mode", config.environment);

    let db = match manager::create_pool(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to initialize database pool: {}", e);
            std::process::exit(1);
        }
    };
    manager::run_migrations(&db).await;

    let storage = storage::from_config(&config.media).await;
    let ctx: SharedContext = Arc::new(AppContext {
        config,
        db,
        storage,
    });

    let app = app(ctx.clone());

    // Allow tests or deployments to override port via env
    let port = std::env::var("CAMPUS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("campus API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(ctx: SharedContext) -> Router {
    // Uploads can exceed the default 2MB body cap; keep some headroom for
    // multipart framing on top of the configured file ceiling.
    let body_limit = ctx.config.media.max_upload_bytes + 1024 * 1024;
    let upload_dir = ctx.config.media.upload_dir.clone();
    let enable_cors = ctx.config.api.enable_cors;

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/auth", handlers::auth::routes())
        .nest("/api/users", handlers::users::routes())
        .nest("/api/forums", handlers::forums::routes())
        .nest("/api/comments", handlers::comments::routes())
        .nest("/api/polls", handlers::polls::routes())
        .nest("/api/groups", handlers::groups::routes())
        .nest(
            "/api/media",
            handlers::media::routes().layer(DefaultBodyLimit::max(body_limit)),
        )
        // Locally stored uploads are served as static files
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(ctx)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "campus-api",
            "version": version,
            "description": "Social networking REST backend",
            "endpoints": {
                "auth": "/api/auth/* (register/login public, rest protected)",
                "users": "/api/users/*",
                "forums": "/api/forums/*",
                "comments": "/api/comments/*",
                "polls": "/api/polls/*",
                "groups": "/api/groups/*",
                "media": "/api/media/* (protected)",
                "uploads": "/uploads/* (public, local backend)",
                "health": "/health (public)",
            }
        }
    }))
}

async fn health(State(ctx): State<SharedContext>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check(&ctx.db).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
