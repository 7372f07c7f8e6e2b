use std::{io, net::TcpListener};

use crate::{
    db::{self, DB},
    routes::{
        create_newsletter, delete_newsletter, get_newsletter, get_user, health_check, home,
        list_newsletters, update_newsletter, ApiError,
    },
    settings::Settings,
};
use actix_web::{dev::Server, error::JsonPayloadError, web, App, HttpRequest, HttpServer};
use sqlx::{migrate::MigrateError, SqlitePool};

use tracing_actix_web::TracingLogger;

#[derive(Debug)]
pub struct ApplicationBuilder {
    settings: Settings,
    db_pool: Option<SqlitePool>,
    tcp_listener: Option<TcpListener>,
}

impl ApplicationBuilder {
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            db_pool: None,
            tcp_listener: None,
        }
    }

    pub fn set_db_pool(mut self, db_pool: SqlitePool) -> Self {
        self.db_pool = Some(db_pool);
        self
    }

    pub fn set_tcp_listener(mut self, tcp_listener: TcpListener) -> Self {
        self.tcp_listener = Some(tcp_listener);
        self
    }

    pub fn build(self) -> Result<Application, io::Error> {
        let Self {
            settings,
            db_pool,
            tcp_listener,
        } = self;

        let db_pool = match db_pool {
            Some(db_pool) => db_pool,
            None => {
                let db: DB = (&settings.database).into();
                db.connect_lazy().map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Couldn't configure a pool for {db}, because \"{e}\""),
                    )
                })?
            }
        };

        let tcp_listener = match tcp_listener {
            Some(tcp_listener) => tcp_listener,
            None => {
                let address = settings.application.address();
                TcpListener::bind(&address).map_err(|e| {
                    io::Error::new(
                        e.kind(),
                        format!("Couldn't bind TCP listener to {address}, because \"{e}\""),
                    )
                })?
            }
        };

        let port = tcp_listener.local_addr()?.port();

        Ok(Application {
            port,
            db_pool,
            tcp_listener,
        })
    }
}

pub struct Application {
    port: u16,
    db_pool: SqlitePool,
    tcp_listener: TcpListener,
}

impl Application {
    pub fn builder_from_settings(settings: Settings) -> ApplicationBuilder {
        ApplicationBuilder::from_settings(settings)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        db::migrate(&self.db_pool).await
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.run()?.await
    }

    pub fn run(self) -> Result<Server, io::Error> {
        let Self {
            tcp_listener,
            db_pool,
            ..
        } = self;

        let db_pool = web::Data::new(db_pool);

        let server = HttpServer::new(move || {
            App::new()
                .wrap(TracingLogger::default())
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .route("/", web::get().to(home))
                .route("/health_check", web::get().to(health_check))
                .route("/newsletters", web::get().to(list_newsletters))
                .route("/newsletters", web::post().to(create_newsletter))
                .route("/newsletters/{id}", web::get().to(get_newsletter))
                .route("/newsletters/{id}", web::patch().to(update_newsletter))
                .route("/newsletters/{id}", web::delete().to(delete_newsletter))
                .route("/users/{id}", web::get().to(get_user))
                .app_data(db_pool.clone())
        })
        .listen(tcp_listener)?
        .run();

        Ok(server)
    }
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::MalformedBody(err.to_string()).into()
}
