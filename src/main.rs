//! Portfolio site backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> std::io::Result<()> {
    portfolio_site::run().await
}
