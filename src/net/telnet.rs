mod connection;
mod crlf_wrapper;

use crate::banner::{BANNER, ENTRY};
use crate::error::{AppResult, InfraError};
use crate::models::PageId;
use crate::net::AppCtx;
use crate::net::output::init_session_for_telnet;
use crate::net::telnet::connection::handle_connection;
use crate::net::telnet::crlf_wrapper::CrlfWriter;
use crate::state::session::Protocol;
use crate::util::telnet::TelnetMachine;
use crate::{Registry, Session};
use parking_lot::RwLock;
use std::sync::Arc;

/// Run the telnet server
pub async fn serve(addr: std::net::SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!(%peer, "client connected");

                let registry = registry.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_telnet_connection(stream, registry).await {
                        tracing::error!(%peer, error=%e, "connection error");
                    }
                    tracing::info!(%peer, "client disconnected");
                });
            }
            Err(e) => {
                tracing::error!(error=%e, "failed to accept connection");
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
        }
    }
}

async fn handle_telnet_connection(stream: tokio::net::TcpStream, registry: Arc<Registry>) -> AppResult<()> {
    let (read_half, write_half) = stream.into_split();

    let mut writer = CrlfWriter::new(write_half);

    // Line mode with local echo, suppress go-ahead, window size
    let mut telnet = TelnetMachine::new();
    telnet.start_negotiation(&mut writer).await?;

    let sess = Arc::new(RwLock::new(Session::new(
        Protocol::Telnet,
        PageId::Home,
        registry.default_skip,
    )));

    let output = init_session_for_telnet(writer);
    output.line(BANNER).await;
    output.system(ENTRY).await;

    let ctx = AppCtx {
        output,
        registry,
        sess,
    };
    handle_connection(read_half, ctx, &mut telnet).await
}
