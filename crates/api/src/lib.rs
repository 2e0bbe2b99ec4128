mod error;
mod event;
mod refresh;
mod refresh_coordinator;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use countdown_infra::CountdownContext;
use event::SeedSampleEventsUseCase;
pub use refresh::{RefreshError, RefreshReport, RefreshState};
use refresh_coordinator::start_refresh_coordinator;
pub use refresh_coordinator::RefreshHandle;
use shared::usecase::execute;
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    refresh::configure_routes(cfg);
    event::configure_routes(cfg);
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: CountdownContext) -> Result<Self, std::io::Error> {
        Application::seed_sample_events(&context).await;
        let refresh = Application::start_job_schedulers(context.clone());
        let (server, port) = Application::configure_server(context, refresh).await?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_job_schedulers(context: CountdownContext) -> RefreshHandle {
        let refresh = start_refresh_coordinator(context);
        // Catch up on events that ended while the server was down
        refresh.request_refresh();
        refresh
    }

    async fn seed_sample_events(context: &CountdownContext) {
        let count = context.config.sample_events;
        if count == 0 {
            return;
        }
        if !context.store.is_ephemeral() {
            warn!("SAMPLE_EVENTS is only used with the in memory store, ignoring it");
            return;
        }
        let usecase = SeedSampleEventsUseCase {
            count,
            seed: context.config.sample_seed,
        };
        if execute(usecase, context).await.is_ok() {
            info!("Seeded {} sample events", count);
        }
    }

    async fn configure_server(
        context: CountdownContext,
        refresh: RefreshHandle,
    ) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();
            let refresh = refresh.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(refresh))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
