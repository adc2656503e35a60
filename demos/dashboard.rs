//! Dashboard example: serve the page on port 8080, accept dashboard clients and
//! publish a fake distance reading every second.
//!
//! Run with: `cargo run --example dashboard`

use std::sync::Arc;
use std::time::Duration;
use picows::{store::MemoryStore, ClientRegistry, Dashboard, Event, Server, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let registry = Arc::new(ClientRegistry::new());
    let dashboard = Arc::new(Dashboard::new(
        registry.clone(),
        Arc::new(MemoryStore::new()),
    ));
    let config = ServerConfig::default().with_bind("0.0.0.0:8080");
    let server = Arc::new(Server::new(config, registry, dashboard.clone()));

    server
        .add_event_handler(|evt| match evt {
            Event::Connected { id, peer } => println!("[Event] {} connected from {:?}", id, peer),
            Event::Disconnected { id } => println!("[Event] {} disconnected", id),
            Event::HttpRequest { request_line, .. } => println!("[Event] HTTP {}", request_line),
        })
        .await;

    tokio::spawn(async move {
        let mut distance = 10.0_f64;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            distance = if distance > 200.0 { 10.0 } else { distance + 7.5 };
            if let Err(e) = dashboard.publish("distance", "value", distance).await {
                eprintln!("publish failed: {}", e);
            }
        }
    });

    let listener = server.bind().await?;
    server.serve(listener).await?;
    Ok(())
}
