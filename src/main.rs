use dotenvy::dotenv;
use registrar::logging::init_tracing;
use registrar::metrics::{init_metrics, metrics_app};
use registrar::router::init_router;
use registrar::state::init_app_state;
use registrar_config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = ServerConfig::from_env();
    init_tracing(&config)?;

    let metrics_handle = init_metrics(&config)?;
    let state = init_app_state().await?;
    let mut app = init_router(state);

    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    let local = listener.local_addr()?;

    println!("🚀 Server running on http://{}", local);
    println!("📚 Swagger UI available at http://{}/swagger-ui", local);
    println!("📖 Scalar UI available at http://{}/scalar", local);

    axum::serve(listener, app).await?;
    Ok(())
}
