use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::sync::Arc;

use pos_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().map_err(|e| std::io::Error::other(e.to_string()))?;

    let pool = create_pool(&config.database)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {e}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let tokens: SharedTokenStore = Arc::new(DbTokenStore::new(pool.clone()));
    let images = ImageStore::new(&config.uploads);
    std::fs::create_dir_all(images.root())?;

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), tokens.clone());
    let user_service = UserService::new(pool.clone(), tokens);
    let category_service = CategoryService::new(pool.clone());
    let product_service = ProductService::new(pool.clone(), images.clone());
    let transaction_service =
        TransactionService::new(pool.clone(), config.inventory.decrement_on_sale);
    let report_service = ReportService::new(pool.clone());

    match auth_service.ensure_admin(&config.bootstrap).await {
        Ok(true) => log::info!("Bootstrap admin account created"),
        Ok(false) => {}
        Err(e) => log::error!("Failed to create bootstrap admin: {e}"),
    }

    if config.inventory.decrement_on_sale {
        log::info!("Stock is decremented on every sale");
    }

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cors_config = config.cors.clone();
    let upload_dir = images.root().to_path_buf();

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors(&cors_config))
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(category_service.clone()))
            .app_data(web::Data::new(product_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .configure(swagger_config)
            .service(Files::new("/uploads", upload_dir.clone()))
            .service(web::scope("/api").configure(handlers::api_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
