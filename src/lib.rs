pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::discount_service::DiscountService;
use application::order_service::OrderService;
use application::read_cache::ReadCache;
use config::AppConfig;
use domain::discount::DiscountEngine;
use domain::ports::CacheStore;
use handlers::ApiDoc;
use infrastructure::db_cache::DatabaseCache;
use infrastructure::order_store::DieselOrderStore;
use infrastructure::redis_cache::RedisCache;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type MigrationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Cache tiers in lookup order: Redis (when configured) in front of the
/// database table. Caching switched off yields no tiers at all.
pub fn build_cache_tiers(
    config: &AppConfig,
    redis: Option<redis::Client>,
    pool: &DbPool,
) -> Vec<Arc<dyn CacheStore>> {
    if !config.cache_enabled {
        return Vec::new();
    }
    let mut tiers: Vec<Arc<dyn CacheStore>> = Vec::new();
    if let Some(client) = redis {
        tiers.push(Arc::new(RedisCache::new(client)));
    }
    tiers.push(Arc::new(DatabaseCache::new(pool.clone())));
    tiers
}

/// Hardening headers added to every API response. Swagger UI is left out
/// because its pages need inline styles.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Strict-Transport-Security", "max-age=31536000; includeSubDomains"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add((
            "Content-Security-Policy",
            "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:; \
             font-src 'self'; connect-src 'self'; object-src 'none'; frame-ancestors 'none'; \
             upgrade-insecure-requests",
        ))
        .add((
            "Permissions-Policy",
            "camera=(), geolocation=(), microphone=(), payment=(), usb=()",
        ))
}

/// Build and return an actix-web `Server` bound to `config.host:config.port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: &AppConfig,
    cache_tiers: Vec<Arc<dyn CacheStore>>,
) -> std::io::Result<actix_web::dev::Server> {
    let cache = ReadCache::new(cache_tiers, config.cache_ttl());
    log::info!("Read cache tiers: {:?}", cache.tier_names());

    let orders = web::Data::new(OrderService::new(DieselOrderStore::new(pool.clone()), cache));
    let discounts = web::Data::new(DiscountService::new(
        DieselOrderStore::new(pool),
        DiscountEngine::new(config.discount_rules()),
    ));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(discounts.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                errors::AppError::validation(err.to_string()).into()
            }))
            .wrap(Logger::default())
            .service(
                web::resource(["/health", "/up"])
                    .wrap(security_headers())
                    .route(web::get().to(handlers::health::health)),
            )
            .service(
                web::scope("/orders")
                    .wrap(security_headers())
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}", web::put().to(handlers::orders::update_order))
                    .route("/{id}", web::delete().to(handlers::orders::delete_order))
                    .route(
                        "/{id}/calculate-discount",
                        web::post().to(handlers::discounts::calculate_discount),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
