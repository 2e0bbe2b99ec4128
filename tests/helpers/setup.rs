use countdown_api::Application;
use countdown_infra::{Config, CountdownContext, FixedSys};
use countdown_sdk::CountdownSDK;
use std::sync::Arc;

/// 2022-06-27T12:00:00Z
pub const NOW: i64 = 1656331200000;

pub struct TestApp {
    pub config: Config,
    /// Clock of the server, only moves when the test moves it
    pub sys: Arc<FixedSys>,
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, CountdownSDK, String) {
    let mut ctx = CountdownContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.config.refresh_interval_secs = 0;
    ctx.config.sample_events = 0;
    let sys = Arc::new(FixedSys::new(NOW));
    ctx.sys = sys.clone();

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let app = TestApp { config, sys };
    let sdk = CountdownSDK::new(address.clone());
    (app, sdk, address)
}
