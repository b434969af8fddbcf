use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let password =
        std::env::var("ETAPI_PASSWORD").unwrap_or_else(|_| mock_server::DEFAULT_PASSWORD.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock ETAPI listening on http://{addr} (password: {password})");
    mock_server::run_with_password(listener, &password).await
}
