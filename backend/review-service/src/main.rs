use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use delivery_policy::DeliveryPolicy;
use review_service::clients::NotificationClient;
use review_service::handlers;
use review_service::kafka::{KafkaReviewEventPublisher, ReviewEventPublisher};
use review_service::services::ReviewService;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: sqlx::Pool<sqlx::Postgres>,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "review-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "review-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

/// Review Service
///
/// Records reviewer decisions, publishes them as events for post-service
/// and exposes the idempotent per-post purge endpoint used by cascading
/// post deletion.
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match review_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting review-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Initialize database connection pool (standardized)
    let mut db_cfg = DbPoolConfig::for_service("review-service");
    if db_cfg.database_url.is_empty() {
        db_cfg.database_url = config.database.url.clone();
    }
    db_cfg.log_config();

    let db_pool = match create_pg_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations").run(&db_pool).await.map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}"))
    })?;

    tracing::info!("Connected to database via db-pool crate");

    // Kafka publisher for review decision events
    let publisher: Arc<dyn ReviewEventPublisher> = Arc::new(
        KafkaReviewEventPublisher::new(
            &config.kafka.brokers,
            config.kafka.review_events_topic.clone(),
            DeliveryPolicy::from_env(),
            Duration::from_millis(config.kafka.request_timeout_ms),
        )
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to create Kafka producer: {e}"),
            )
        })?,
    );

    let mut review_service = ReviewService::new(db_pool.clone(), publisher);

    if let Some(base_url) = &config.notifications.base_url {
        let client = NotificationClient::new(
            base_url.clone(),
            Duration::from_millis(config.notifications.timeout_ms),
        )
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to build notification client: {e}"),
            )
        })?;
        review_service =
            review_service.with_notifier(Arc::new(client), config.notifications.recipient.clone());
        tracing::info!("Decision notifications enabled");
    } else {
        tracing::info!("NOTIFICATION_SERVICE_URL not set; decision notifications disabled");
    }

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let service_data = web::Data::new(review_service);
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
    });

    let cors_origins = config.cors.allowed_origins.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(service_data.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(review_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1").service(
                    web::scope("/reviews")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::get_reviews))
                                .route(web::post().to(handlers::create_review)),
                        )
                        .service(
                            web::resource("/post/{post_id}")
                                .route(web::get().to(handlers::get_reviews_by_post))
                                .route(web::delete().to(handlers::delete_reviews_by_post)),
                        )
                        .service(
                            web::resource("/status/{status}")
                                .route(web::get().to(handlers::get_reviews_by_status)),
                        )
                        .service(
                            web::resource("/{review_id}")
                                .route(web::get().to(handlers::get_review))
                                .route(web::put().to(handlers::update_review))
                                .route(web::delete().to(handlers::delete_review)),
                        ),
                ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run()
    .await
}
