use dotenvy::dotenv;
use order_management::config::AppConfig;
use order_management::{build_cache_tiers, build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = create_pool(&config.database_url).expect("Failed to create database connection pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    // Redis is optional; without it the database table is the only cache tier.
    let redis = config
        .redis_url
        .as_deref()
        .and_then(|url| match redis::Client::open(url) {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("Invalid REDIS_URL, continuing without Redis: {}", e);
                None
            }
        });
    let tiers = build_cache_tiers(&config, redis, &pool);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, &config, tiers)?.await
}
