use crate::animation::Frame;
use crate::models::Page;
use crate::net::sink::ClientSink;
use crate::net::sink::telnet::TelnetSink;
use crate::net::sink::websocket::WebSocketSink;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum OutFrame {
    /// Animation frame of the current page view
    Anim(Frame),
    /// A new page view starts; `clear` wipes the screen first
    PageView { page: Arc<Page>, clear: bool },
    /// Regular text line
    Line(String),
    /// Message from the server itself, not page content
    System(String),
    /// Shell prompt, the cursor stays behind it
    Prompt(String),
    /// Skip was switched off; the client starts the page view over
    Restart,
    /// Blue screen
    Bsod,
    /// The user submitted a line (the client echoed it)
    InputEcho,
    /// Client window size
    Resize { cols: u16, rows: u16 },
    /// Clear screen
    ClearScreen,
    /// Raw bytes for telnet IAC sequences
    Raw(Vec<u8>),
}

#[derive(Clone)]
pub struct OutputHandle {
    /// Sender for output events
    tx: mpsc::Sender<OutEvent>,
    /// Next sequence number for output frames
    next_seq: Arc<AtomicU64>,
}

impl OutputHandle {
    pub fn new(tx: mpsc::Sender<OutEvent>) -> Self {
        Self {
            tx,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    #[inline]
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Push an animation frame. Fails once the client side is gone, which
    /// is what ends a running page view.
    pub async fn anim(&self, frame: Frame) -> anyhow::Result<()> {
        self.send(OutFrame::Anim(frame)).await
    }

    pub async fn send(&self, frame: OutFrame) -> anyhow::Result<()> {
        self.tx
            .send(OutEvent::Frame(frame, self.next_seq()))
            .await
            .map_err(|_| anyhow::anyhow!("client output closed"))
    }

    pub async fn page_view(&self, page: Arc<Page>, clear: bool) {
        let _ = self.send(OutFrame::PageView { page, clear }).await;
    }

    pub async fn line(&self, s: impl Into<String>) {
        let _ = self.send(OutFrame::Line(s.into())).await;
    }

    pub async fn system(&self, s: impl Into<String>) {
        let _ = self.send(OutFrame::System(s.into())).await;
    }

    pub async fn prompt(&self, s: impl Into<String>) {
        let _ = self.send(OutFrame::Prompt(s.into())).await;
    }

    pub async fn restart(&self) {
        let _ = self.send(OutFrame::Restart).await;
    }

    pub async fn bsod(&self) {
        let _ = self.send(OutFrame::Bsod).await;
    }

    pub async fn input_echo(&self) {
        let _ = self.send(OutFrame::InputEcho).await;
    }

    pub async fn resize(&self, cols: u16, rows: u16) {
        let _ = self.send(OutFrame::Resize { cols, rows }).await;
    }

    pub async fn clear(&self) {
        let _ = self.send(OutFrame::ClearScreen).await;
    }

    pub async fn raw(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(OutEvent::Raw(bytes, self.next_seq())).await;
    }
}

pub enum OutEvent {
    /// A complete output frame with sequence number
    Frame(OutFrame, u64),
    /// Raw data for telnet IAC sequences with sequence number
    Raw(Vec<u8>, u64),
}

pub struct SessionOut {
    rx: mpsc::Receiver<OutEvent>,
}

impl SessionOut {
    pub fn new(rx: mpsc::Receiver<OutEvent>) -> Self {
        Self { rx }
    }

    pub async fn run<C>(mut self, mut client: C) -> anyhow::Result<()>
    where
        C: ClientSink,
    {
        while let Some(event) = self.rx.recv().await {
            match event {
                OutEvent::Frame(frame, seq_nr) => client.send_frame(frame, seq_nr).await?,
                OutEvent::Raw(bytes, seq_nr) => client.send_frame(OutFrame::Raw(bytes), seq_nr).await?,
            }
        }

        client.close().await
    }
}

pub fn init_session_for_telnet<W>(telnet_writer: W) -> OutputHandle
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_session_out(TelnetSink::new(telnet_writer))
}

pub fn init_session_for_websocket(websocket_writer: SplitSink<WebSocket, Message>) -> OutputHandle {
    spawn_session_out(WebSocketSink::new(websocket_writer))
}

fn spawn_session_out<C>(sink: C) -> OutputHandle
where
    C: ClientSink + 'static,
{
    let (tx, rx) = mpsc::channel::<OutEvent>(64);
    let session_out = SessionOut::new(rx);

    tokio::spawn(async move {
        if let Err(e) = session_out.run(sink).await {
            tracing::debug!(error = %e, "session output ended");
        }
    });

    OutputHandle::new(tx)
}
