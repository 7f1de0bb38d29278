use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut store = mock_server::Store::seeded();
    if let Ok(key) = std::env::var("MOCK_API_KEY") {
        store.api_key = key;
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    log::info!(
        "listening on {addr} (api base http://{addr}/3, session {}, account {})",
        mock_server::SESSION_ID,
        mock_server::ACCOUNT_ID
    );
    mock_server::run_with(listener, store).await
}
