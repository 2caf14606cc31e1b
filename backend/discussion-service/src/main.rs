use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use discussion_service::handlers::{self, AppState};
use discussion_service::{db, Config};
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" })),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "status": "unhealthy" }))
        }
    }
}

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_any_header()
        .max_age(3600);

    if allowed_origins.trim() == "*" {
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
    }

    cors
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    let pool = db::create_pool(&config.database).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = web::Data::new(AppState::new(pool.clone()));
    let allowed_origins = config.cors.allowed_origins.clone();

    tracing::info!(
        host = %config.app.host,
        port = config.app.port,
        env = %config.app.env,
        "starting discussion-service"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(build_cors(&allowed_origins))
            .app_data(state.clone())
            .app_data(web::Data::new(pool.clone()))
            .route("/health", web::get().to(health))
            .configure(handlers::configure)
    })
    .bind((config.app.host.as_str(), config.app.port))?
    .run()
    .await?;

    Ok(())
}
