//! Application assembly: container, lifecycle, router and listener.

use axum::{Router, middleware};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, HttpConfig, ServerConfig};
use crate::di::ContainerBuilder;
use crate::error::Result;
use crate::infrastructure::{Connector, Database, TcpConnector};
use crate::lifecycle::{Application, shutdown_signal};
use crate::middleware::{BodyLimit, parse_json_body};
use crate::module::Module;
use crate::modules::AppModule;
use crate::router::{HandlerRegistry, ROUTES, bind_routes};
use crate::state::AppState;

const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(30);
const DESTROY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App {
    application: Application,
    router: Router,
    database: Database,
}

impl App {
    /// Builds the application with a TCP connection to the configured database.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let connector = Arc::new(TcpConnector::new(config.database.connect_timeout));
        Self::with_connector(config, connector).await
    }

    /// Builds the application and starts connecting to the database in the
    /// background. Returns once the router is ready; the database may still be
    /// connecting.
    pub async fn with_connector(config: &AppConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        let database = Database::new(&config.database, connector);

        let mut container = ContainerBuilder::new().register(database.clone()).build();
        AppModule::register(&mut container)?;

        // Fails before anything is started if a route names a missing handler.
        let routes = bind_routes(ROUTES, &HandlerRegistry::standard())?;

        let application = Application::builder()
            .container(container)
            .register_lifecycle(Arc::new(RwLock::new(database.clone())), "Database")
            .bootstrap_timeout(BOOTSTRAP_TIMEOUT)
            .destroy_timeout(DESTROY_TIMEOUT)
            .build()
            .await?;

        let state = AppState::new(Arc::clone(application.container()));
        let router = finish_router(routes, state, &config.http);

        Ok(Self {
            application,
            router,
            database,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Serves until Ctrl+C or SIGTERM, then runs the shutdown hooks.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("Initiating graceful shutdown...");
        self.application.shutdown().await?;
        Ok(())
    }
}

fn finish_router(routes: Router<AppState>, state: AppState, http: &HttpConfig) -> Router {
    routes
        .layer(middleware::from_fn_with_state(
            BodyLimit(http.body_limit),
            parse_json_body,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured listen address.
pub async fn bind(server: &ServerConfig) -> Result<TcpListener> {
    let addr = server.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::debug!(%addr, "Listener bound");
    Ok(listener)
}
