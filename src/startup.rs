use std::net::TcpListener;
use std::time::Duration;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::middleware::from_fn;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_flash_messages::storage::CookieMessageStore;
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tera::Tera;
use tracing_actix_web::TracingLogger;

use crate::authentication::{reject_non_admin_users, require_admin, require_login};
use crate::configuration::{DatabaseSettings, Settings};
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::*;
use crate::storage_client::StorageClient;

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Largest accepted CSV import.
const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

pub struct Application {
    port: u16,
    server: Server,
}

/// Public origin used to build links sent by email.
pub struct ApplicationBaseUrl(pub String);

/// Where contact form notifications are delivered.
pub struct ContactInbox(pub SubscriberEmail);

#[derive(Clone)]
pub struct HmacSecret(pub SecretString);

struct AppState {
    db_pool: PgPool,
    email_client: EmailClient,
    storage_client: StorageClient,
    templates: Tera,
    base_url: String,
    contact_inbox: SubscriberEmail,
    hmac_secret: HmacSecret,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let db_pool = get_connection_pool(&config.database);
        let email_client = config.email_client.client()?;
        let storage_client = config.storage.client()?;
        let contact_inbox = SubscriberEmail::parse(config.application.contact_inbox)
            .map_err(anyhow::Error::msg)
            .context("Invalid contact inbox address.")?;
        let templates = Tera::new("views/**/*").context("Failed to load the HTML templates.")?;

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let state = AppState {
            db_pool,
            email_client,
            storage_client,
            templates,
            base_url: config.application.base_url,
            contact_inbox,
            hmac_secret: HmacSecret(config.application.hmac_secret),
        };
        let server = run(listener, state)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(db_config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_config.with_db())
}

/// Malformed JSON bodies get the same `{"message"}` shape as every other API error.
fn json_error_handler(err: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(serde_json::json!({ "message": err.to_string() }));
    InternalError::from_response(err, response).into()
}

fn run(listener: TcpListener, state: AppState) -> Result<Server, anyhow::Error> {
    let db_pool = web::Data::new(state.db_pool);
    let email_client = web::Data::new(state.email_client);
    let storage_client = web::Data::new(state.storage_client);
    let templates = web::Data::new(state.templates);
    let base_url = web::Data::new(ApplicationBaseUrl(state.base_url));
    let contact_inbox = web::Data::new(ContactInbox(state.contact_inbox));
    let secret_key = Key::from(state.hmac_secret.0.expose_secret().as_bytes());
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(TracingLogger::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/health_check", web::get().to(health_check))
            // Public site
            .route("/", web::get().to(home))
            .route("/blog", web::get().to(blog_index))
            .route("/blog/{slug}", web::get().to(blog_post))
            .route("/projects", web::get().to(projects_index))
            .route("/projects/{slug}", web::get().to(project_detail))
            .route("/services", web::get().to(services_index))
            .route("/services/{slug}", web::get().to(service_detail))
            .route("/contact", web::get().to(contact_page))
            .route("/newsletter/verified", web::get().to(newsletter_verified))
            // Auth pages
            .route("/login", web::get().to(login_form))
            .route("/login", web::post().to(login))
            .route("/register", web::get().to(register_form))
            .route("/register", web::post().to(register))
            .route("/auth/forgot-password", web::get().to(forgot_password_form))
            .route("/auth/forgot-password", web::post().to(forgot_password))
            .route("/auth/reset-password", web::get().to(reset_password_form))
            .route("/auth/reset-password", web::post().to(reset_password))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_non_admin_users))
                    .route("/dashboard", web::get().to(admin_dashboard))
                    .route("/logout", web::post().to(log_out))
                    .route("/password", web::get().to(change_password_form))
                    .route("/password", web::post().to(change_password))
                    .route("/users", web::get().to(list_users))
                    .route("/users", web::post().to(create_user))
                    .route("/newsletter/subscribers", web::get().to(subscribers_page))
                    .route("/newsletter/campaigns", web::get().to(campaigns_page)),
            )
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/admin")
                            .wrap(from_fn(require_admin))
                            .route("/categories", web::post().to(create_category))
                            .route("/categories/{id}", web::patch().to(update_category))
                            .route("/categories/{id}", web::delete().to(delete_category))
                            .route("/blogs", web::get().to(admin_list_blogs))
                            .route("/blogs", web::post().to(create_blog))
                            .route("/blogs/{id}", web::get().to(admin_get_blog))
                            .route("/blogs/{id}", web::patch().to(update_blog))
                            .route("/blogs/{id}", web::delete().to(delete_blog))
                            .route("/projects", web::post().to(create_project))
                            .route("/projects/{id}", web::patch().to(update_project))
                            .route("/projects/{id}", web::delete().to(delete_project))
                            .route("/services", web::post().to(create_service))
                            .route("/services/{id}", web::patch().to(update_service))
                            .route("/services/{id}", web::delete().to(delete_service))
                            .route("/users/{id}", web::patch().to(update_user))
                            .route("/users/{id}", web::delete().to(delete_user))
                            .service(
                                web::resource("/upload")
                                    .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
                                    .route(web::post().to(upload_image)),
                            )
                            .service(
                                web::scope("/newsletter")
                                    .route("/subscribers", web::get().to(get_subscribers))
                                    .route("/subscribers", web::post().to(create_subscriber))
                                    .route("/subscribers/bulk", web::post().to(bulk_update_subscribers))
                                    .service(
                                        web::resource("/subscribers/import")
                                            .app_data(web::PayloadConfig::new(MAX_IMPORT_BYTES))
                                            .route(web::post().to(import_subscribers)),
                                    )
                                    .route("/subscribers/{id}", web::get().to(get_subscriber))
                                    .route("/subscribers/{id}", web::patch().to(update_subscriber))
                                    .route("/subscribers/{id}", web::delete().to(delete_subscriber))
                                    .route("/templates", web::get().to(get_templates))
                                    .route("/templates", web::post().to(create_template))
                                    .route("/templates/{id}", web::get().to(get_template))
                                    .route("/templates/{id}", web::patch().to(update_template))
                                    .route("/templates/{id}", web::delete().to(delete_template))
                                    .route("/campaigns", web::get().to(get_campaigns))
                                    .route("/campaigns", web::post().to(create_campaign))
                                    .route("/campaigns/{id}", web::get().to(get_campaign))
                                    .route("/campaigns/{id}", web::patch().to(update_campaign))
                                    .route("/campaigns/{id}", web::delete().to(delete_campaign))
                                    .route("/campaigns/{id}/send", web::post().to(send_campaign))
                                    .route("/campaigns/{id}/test", web::post().to(send_test_campaign)),
                            ),
                    )
                    .service(
                        web::resource("/profile")
                            .wrap(from_fn(require_login))
                            .route(web::post().to(update_profile)),
                    )
                    .route("/blogs", web::get().to(get_blogs))
                    .route("/blogs/{id}", web::get().to(get_blog))
                    .route("/projects", web::get().to(get_projects))
                    .route("/projects/{id}", web::get().to(get_project))
                    .route("/categories", web::get().to(get_categories))
                    .route("/categories/{id}", web::get().to(get_category))
                    .route("/services", web::get().to(get_services))
                    .route("/contact", web::post().to(contact))
                    .route("/newsletter/subscribe", web::post().to(subscribe))
                    .route("/newsletter/verify", web::get().to(verify)),
            )
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(storage_client.clone())
            .app_data(templates.clone())
            .app_data(base_url.clone())
            .app_data(contact_inbox.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
