use huddle_server::{serve, Config};
use tokio::net::TcpListener;

/// Start a server on an ephemeral port and return its `host:port`.
pub async fn spawn_server(refresh_interval_ms: u64) -> String {
    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        refresh_interval_ms,
        ..Config::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, config, std::future::pending()).await.unwrap();
    });
    format!("127.0.0.1:{}", addr.port())
}
