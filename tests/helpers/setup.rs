use subtrack_api::Application;
use subtrack_infra::SubtrackContext;
use subtrack_sdk::SubtrackSDK;

pub struct TestApp {
    pub ctx: SubtrackContext,
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, SubtrackSDK, String) {
    let mut ctx = SubtrackContext::create_inmemory();
    ctx.config.port = 0; // Random port

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let app = TestApp { ctx };
    let sdk = SubtrackSDK::new(address.clone());
    (app, sdk, address)
}
