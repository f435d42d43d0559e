use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let empty = std::env::var("MOCK_EMPTY").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    let router = if empty {
        mock_server::empty_app()
    } else {
        mock_server::app()
    };
    info!(%addr, seeded = !empty, "listening");
    mock_server::run_with(listener, router).await
}
