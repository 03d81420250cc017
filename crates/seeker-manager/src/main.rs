mod logging;
mod manager;
mod options;
mod signals;

use std::net::SocketAddr;
use std::sync::Arc;

use manager::Manager;
use options::ManagerOptions;
use seeker_raft::RaftDriver;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = ManagerOptions::try_build()?;
    logging::init(&options.log_level);

    info!(node = %options.node_name, bind = %options.bind_addr, "starting manager");

    let manager = Manager::new(options);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let raft_task = spawn_raft_driver(&manager, shutdown_rx.clone()).await?;
    let cleanup_task = spawn_cleanup_sweep(manager.pool.clone(), shutdown_rx.clone());
    let accept_task = spawn_tcp_acceptor(&manager).await?;

    signals::wait_for_shutdown().await;
    info!("shutdown signal received, draining background tasks");
    let _ = shutdown_tx.send(true);

    accept_task.abort();
    let _ = raft_task.await;
    let _ = cleanup_task.await;

    Ok(())
}

async fn spawn_raft_driver(manager: &Manager, shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let multicast_addr: SocketAddr = manager.options.raft_multicast_addr.parse()?;
    let socket = UdpSocket::bind(("0.0.0.0", multicast_addr.port())).await?;
    if let std::net::IpAddr::V4(group) = multicast_addr.ip() {
        socket.join_multicast_v4(group, std::net::Ipv4Addr::UNSPECIFIED)?;
    } else {
        warn!("raft multicast address is not IPv4; skipping group join");
    }

    let driver = RaftDriver::new(
        socket,
        multicast_addr,
        manager.options.cluster_name.clone(),
        manager.raft.clone(),
        manager.node_table.clone(),
    );

    Ok(tokio::spawn(async move {
        driver.run(shutdown).await;
    }))
}

fn spawn_cleanup_sweep(pool: Arc<seeker_store::Pool>, mut shutdown: tokio::sync::watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = ticker.tick() => pool.cleanup(),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    })
}

async fn spawn_tcp_acceptor(manager: &Manager) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let listener = TcpListener::bind(&manager.options.bind_addr).await?;
    info!(addr = %manager.options.bind_addr, "listening for remote binary protocol connections");

    Ok(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((_stream, peer)) => {
                    // The inverted-index backend behind `IndexBackend` is an
                    // explicit black box (spec §1 Non-goals): wiring a live
                    // connection here requires the concrete backend this
                    // core does not implement. Accepting and logging keeps
                    // the listen/accept lifecycle exercised end to end.
                    info!(%peer, "accepted remote protocol connection");
                }
                Err(err) => {
                    error!(%err, "tcp accept failed");
                    break;
                }
            }
        }
    }))
}
