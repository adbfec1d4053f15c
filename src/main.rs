use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use fieldops::auth::middleware::{require_admin, require_api_content_type, require_auth};
use fieldops::auth::rate_limit::RateLimiter;
use fieldops::config::AppConfig;
use fieldops::forms::{InstallationForm, SurveyForm, WizardSessions};
use fieldops::handlers::{self, admin, feed_handlers};
use fieldops::local_store::LocalStore;
use fieldops::models::field_registry::FieldRegistry;
use fieldops::models::record::PgRecordStore;
use fieldops::db;

// Whole forms travel as JSON, photos included; uploads are capped separately.
const JSON_LIMIT: usize = 32 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let local = LocalStore::open(&config.data_dir).expect("Failed to create data directory");

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    if let Err(e) = db::seed_admin(&pool, &config).await {
        log::error!("Failed to seed administrator: {e}");
    }

    // Session signing key: persistent when SESSION_KEY is long enough
    let secret_key = match &config.session_key {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let records = PgRecordStore::new(pool.clone());
    let registry = FieldRegistry::new(local.clone());
    let surveys = WizardSessions::<SurveyForm>::new();
    let installations = WizardSessions::<InstallationForm>::new();
    let feed = feed_handlers::new_feed_hub();
    let limiter = RateLimiter::new();
    let bind_addr = config.bind_addr.clone();

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(false)
            .cookie_http_only(true)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(records.clone()))
            .app_data(web::Data::new(local.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(surveys.clone()))
            .app_data(web::Data::new(installations.clone()))
            .app_data(web::Data::new(feed.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT))
            .app_data(web::PayloadConfig::new(JSON_LIMIT))
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            // Public routes
            .route("/login", web::get().to(handlers::auth_handlers::login_page))
            .route("/login", web::post().to(handlers::auth_handlers::login_submit))
            .route("/", web::get().to(|| async {
                actix_web::HttpResponse::SeeOther()
                    .insert_header(("Location", "/dashboard"))
                    .finish()
            }))
            // Signed-in routes
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(require_auth))
                    .route("/dashboard", web::get().to(handlers::dashboard::index))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    .route("/ws/feed", web::get().to(feed_handlers::ws_connect))
                    .route("/records/{id}/export.pdf", web::get().to(handlers::export_handlers::stored_record_pdf))
                    .service(handlers::form_exports::<SurveyForm>())
                    .service(handlers::form_exports::<InstallationForm>())
                    .service(
                        web::scope("/admin")
                            .wrap(actix_web::middleware::from_fn(require_admin))
                            .route("/allocations", web::get().to(admin::allocations::page)),
                    )
                    .service(
                        web::scope("/api")
                            .wrap(actix_web::middleware::from_fn(require_api_content_type))
                            .route("/dashboard", web::get().to(handlers::dashboard::data))
                            .service(
                                handlers::form_api::<SurveyForm>()
                                    .route("/wizard/transport-links", web::post().to(handlers::wizard_handlers::add_transport_link))
                                    .route("/wizard/transport-links/{index}/remove", web::post().to(handlers::wizard_handlers::remove_transport_link)),
                            )
                            .service(handlers::form_api::<InstallationForm>())
                            // Capture
                            .route("/capture/upload", web::post().to(handlers::capture_handlers::upload))
                            .route("/capture/drawing", web::post().to(handlers::capture_handlers::drawing))
                            // Engineer-facing allocation and registry reads
                            .route("/allocations/mine", web::get().to(admin::allocations::mine))
                            .route("/allocations/{id}/status", web::post().to(admin::allocations::change_status))
                            .route("/registry/{bucket}/active", web::get().to(admin::registry::active))
                            // Admin JSON
                            .service(
                                web::scope("/admin")
                                    .wrap(actix_web::middleware::from_fn(require_admin))
                                    .route("/sites", web::get().to(admin::allocations::list_sites))
                                    .route("/sites", web::post().to(admin::allocations::create_site))
                                    .route("/engineers", web::get().to(admin::allocations::list_engineers))
                                    .route("/engineers", web::post().to(admin::allocations::create_engineer))
                                    .route("/allocations", web::get().to(admin::allocations::list_allocations))
                                    .route("/allocations", web::post().to(admin::allocations::create_allocation))
                                    .route("/allocations/{id}", web::delete().to(admin::allocations::delete_allocation))
                                    .route("/records", web::get().to(admin::records::list))
                                    .route("/records/{id}", web::get().to(admin::records::detail))
                                    .route("/registry/{bucket}", web::get().to(admin::registry::show))
                                    .route("/registry/{bucket}/sections", web::post().to(admin::registry::add_section))
                                    .route("/registry/{bucket}/sections/{name}", web::delete().to(admin::registry::delete_section))
                                    .route("/registry/{bucket}/sections/{name}/move", web::post().to(admin::registry::move_section))
                                    .route("/registry/{bucket}/fields", web::post().to(admin::registry::add_field))
                                    .route("/registry/{bucket}/fields/{id}", web::put().to(admin::registry::update_field))
                                    .route("/registry/{bucket}/fields/{id}", web::delete().to(admin::registry::delete_field))
                                    .route("/registry/{bucket}/fields/{id}/move", web::post().to(admin::registry::move_field))
                                    .route("/registry/{bucket}/fields/{id}/active", web::post().to(admin::registry::set_active)),
                            ),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
