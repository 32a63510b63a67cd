use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use delivery_policy::{DeliveryPolicy, KafkaDeadLetterPublisher};
use post_service::clients::{HttpReviewPurgeClient, ReviewPurgeClient};
use post_service::consumers::{
    ReviewStatusApplier, ReviewStatusConsumer, ReviewStatusConsumerConfig,
};
use post_service::db::{PostRepository, SqlxPostRepository};
use post_service::handlers;
use post_service::services::{DeletionCoordinator, PostService};
use rdkafka::producer::FutureProducer;
use rdkafka::ClientConfig;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
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
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "post-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// Post Service
///
/// Owns the post entities of the newsroom backend.
///
/// # Routes
///
/// - `/api/v1/posts/*` - Create, read, update, search and delete posts
///
/// # Architecture
///
/// - HTTP handlers with request/response conversion
/// - PostgreSQL for persistent storage
/// - Kafka consumer applying review decisions to post status
/// - Synchronous review purge call guarding cascading deletes
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
    let config = match post_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Initialize database connection pool (standardized)
    let mut db_cfg = DbPoolConfig::for_service("post-service");
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

    // Wire the repository, CRUD service and deletion coordinator
    let repo: Arc<dyn PostRepository> = Arc::new(SqlxPostRepository::new(db_pool.clone()));
    let post_service = PostService::new(Arc::clone(&repo));

    let purge_client: Arc<dyn ReviewPurgeClient> = Arc::new(
        HttpReviewPurgeClient::new(
            config.review_client.base_url.clone(),
            Duration::from_millis(config.review_client.timeout_ms),
        )
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to build review purge client: {e}"),
            )
        })?,
    );
    let coordinator = DeletionCoordinator::new(Arc::clone(&repo), purge_client);

    // Kafka producer used only for dead-lettering undeliverable events
    let dlq_producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &config.kafka.brokers)
        .set("enable.idempotence", "true")
        .set("acks", "all")
        .create()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to create Kafka producer: {e}"),
            )
        })?;
    let dead_letters = KafkaDeadLetterPublisher::new(
        dlq_producer,
        Duration::from_millis(config.kafka.request_timeout_ms),
    );

    let delivery_policy = DeliveryPolicy::from_env();
    let applier = Arc::new(ReviewStatusApplier::new(Arc::clone(&repo)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer_config = ReviewStatusConsumerConfig {
        brokers: config.kafka.brokers.clone(),
        topic: config.kafka.review_events_topic.clone(),
        group_id: config.kafka.consumer_group.clone(),
    };
    let mut consumer = ReviewStatusConsumer::new(
        &consumer_config,
        applier,
        dead_letters,
        delivery_policy,
        shutdown_rx,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e}")))?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let post_service_data = web::Data::new(post_service);
    let coordinator_data = web::Data::new(coordinator);
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
    });

    let cors_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
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
            .app_data(post_service_data.clone())
            .app_data(coordinator_data.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(post_service::metrics::serve_metrics))
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1").service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::get_posts))
                                .route(web::post().to(handlers::create_post)),
                        )
                        .service(
                            web::resource("/search")
                                .route(web::get().to(handlers::search_posts)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(handlers::get_post))
                                .route(web::put().to(handlers::update_post))
                                .route(web::delete().to(handlers::delete_post)),
                        ),
                ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();

    let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();

    // HTTP server task
    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    // Review status consumer task
    tasks.spawn(async move {
        consumer
            .run()
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e}")))
    });

    let mut first_error: Option<io::Error> = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(_))) => {
                        tracing::info!("Background task completed");
                    }
                    Some(Ok(Err(e))) => {
                        tracing::error!("Task returned error: {}", e);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                        let _ = shutdown_tx.send(true);
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Task join error: {}", e);
                        if first_error.is_none() {
                            first_error = Some(io::Error::new(io::ErrorKind::Other, e.to_string()));
                        }
                        let _ = shutdown_tx.send(true);
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
                server_handle.stop(true).await;
                tasks.shutdown().await;
                break;
            }
        }
    }

    tracing::info!("Post-service shutting down");

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
