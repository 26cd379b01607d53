use pathmap::{AppState, Config, PointSource, Poller, ingest::{Receiver, Signing}, router};
use std::net::SocketAddr;
use tokio::fs;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.points_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    if let Some(udp_port) = config.udp_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], udp_port));
        let signing = Signing::from_config(&config);
        if signing == (Signing::Signed { secret: None }) {
            warn!("SIGNED is set without GPS2UDP_SECRET; every packet will be rejected");
        }
        match Receiver::bind(addr, config.points_path.clone(), signing).await {
            Ok(receiver) => {
                tokio::spawn(receiver.run());
            }
            Err(err) => error!("failed to bind UDP receiver on {addr}: {err}"),
        }
    }

    let source = PointSource::from_config(&config)?;
    let poller = Poller::new(source, &config);
    tokio::spawn(poller.clone().run());

    let state = AppState::new(poller, config.poll_interval.as_secs());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
