use crate::engine::search::AlphaBetaEngine;
use crate::engine::{EngineMove, MoveEngine};
use crate::error::EngineError;
use async_trait::async_trait;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// Hard per-call deadline. A timeout fails the call but leaves the worker
/// alone; recovery is an explicit [`EngineHandle::restart`].
pub const CALCULATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests sent into the worker thread.
#[derive(Debug, Clone)]
pub enum Request {
    Init,
    Calculate { id: u64, fen: String, depth: u8 },
}

/// Replies coming back out. The readiness signal travels on a dedicated
/// watch channel instead, so late subscribers observe it idempotently.
#[derive(Debug, Clone)]
pub enum Reply {
    Move { id: u64, mv: WireMove },
    Error { id: u64, reason: String },
}

/// Move as it crosses the worker channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMove {
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
}

impl From<EngineMove> for WireMove {
    fn from(mv: EngineMove) -> Self {
        Self {
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            promotion: mv.promotion.map(|role| role.char()),
        }
    }
}

impl WireMove {
    fn decode(&self) -> Result<EngineMove, EngineError> {
        let promotion = self.promotion.map(String::from).unwrap_or_default();
        EngineMove::from_uci(&format!("{}{}{}", self.from, self.to, promotion))
            .ok_or_else(|| EngineError::InvalidReply(format!("{}{}{}", self.from, self.to, promotion)))
    }
}

struct WorkerLink {
    tx: mpsc::UnboundedSender<Request>,
    replies: mpsc::UnboundedReceiver<Reply>,
    ready: watch::Receiver<bool>,
}

impl WorkerLink {
    fn spawn() -> Self {
        let (tx, req_rx) = mpsc::unbounded_channel();
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let (ready_tx, ready) = watch::channel(false);

        std::thread::spawn(move || run_worker(req_rx, reply_tx, ready_tx));

        // One-time INIT; the worker answers with the readiness signal.
        let _ = tx.send(Request::Init);

        Self { tx, replies, ready }
    }
}

/// The caller side of the search worker boundary.
///
/// At most one `calculate` may be in flight per handle; a second
/// concurrent call is rejected with [`EngineError::Busy`] rather than
/// collapsed onto the next reply.
pub struct EngineHandle {
    link: Mutex<WorkerLink>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl EngineHandle {
    pub fn spawn() -> Self {
        Self::with_timeout(CALCULATE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            link: Mutex::new(WorkerLink::spawn()),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    #[cfg(test)]
    fn with_channels(
        tx: mpsc::UnboundedSender<Request>,
        replies: mpsc::UnboundedReceiver<Reply>,
        ready: watch::Receiver<bool>,
        timeout: Duration,
    ) -> Self {
        Self {
            link: Mutex::new(WorkerLink { tx, replies, ready }),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Waits for the worker's one-time readiness signal. Safe to call from
    /// any number of tasks; all of them unblock once, and late callers see
    /// the already-ready state immediately.
    pub async fn wait_ready(&self) -> Result<(), EngineError> {
        let mut ready = { self.link.lock().await.ready.clone() };
        loop {
            if *ready.borrow() {
                return Ok(());
            }
            ready.changed().await.map_err(|_| EngineError::Unavailable)?;
        }
    }

    /// Terminates the current worker and spins up a fresh one. Any
    /// outstanding reply from the old worker is dropped on the floor.
    pub async fn restart(&self) {
        let mut link = self.link.lock().await;
        tracing::info!("restarting engine worker");
        *link = WorkerLink::spawn();
    }

    async fn calculate_inner(&self, fen: &str, depth: u8) -> Result<EngineMove, EngineError> {
        let mut link = self.link.try_lock().map_err(|_| EngineError::Busy)?;

        let mut ready = link.ready.clone();
        loop {
            if *ready.borrow() {
                break;
            }
            ready.changed().await.map_err(|_| EngineError::Unavailable)?;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        link.tx
            .send(Request::Calculate {
                id,
                fen: fen.to_string(),
                depth,
            })
            .map_err(|_| EngineError::Unavailable)?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let reply = tokio::time::timeout_at(deadline, link.replies.recv())
                .await
                .map_err(|_| EngineError::Timeout)?
                .ok_or(EngineError::Unavailable)?;
            match reply {
                Reply::Move { id: reply_id, mv } if reply_id == id => return mv.decode(),
                Reply::Error { id: reply_id, reason } if reply_id == id => {
                    return Err(EngineError::Rejected(reason))
                }
                stale => {
                    // A reply correlated with an earlier, timed-out call.
                    tracing::debug!(?stale, current = id, "discarding stale worker reply");
                }
            }
        }
    }
}

#[async_trait]
impl MoveEngine for EngineHandle {
    async fn calculate(&self, fen: &str, depth: u8) -> Result<EngineMove, EngineError> {
        self.calculate_inner(fen, depth).await
    }
}

fn run_worker(
    mut requests: mpsc::UnboundedReceiver<Request>,
    replies: mpsc::UnboundedSender<Reply>,
    ready: watch::Sender<bool>,
) {
    let mut engine = AlphaBetaEngine::new();

    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::Init => {
                let _ = ready.send(true);
            }
            Request::Calculate { id, fen, depth } => {
                let reply = match compute(&mut engine, &fen, depth) {
                    Ok(mv) => Reply::Move { id, mv },
                    Err(reason) => Reply::Error { id, reason },
                };
                if replies.send(reply).is_err() {
                    // Handle side gone; the worker has been terminated.
                    break;
                }
            }
        }
    }
}

fn compute(engine: &mut AlphaBetaEngine, fen: &str, depth: u8) -> Result<WireMove, String> {
    let pos: Chess = fen
        .parse::<Fen>()
        .map_err(|e| format!("bad position: {e}"))?
        .into_position(CastlingMode::Standard)
        .map_err(|e| format!("bad position: {e}"))?;

    let outcome = engine.choose_move(&pos, depth).map_err(|e| e.to_string())?;
    tracing::debug!(
        score = outcome.score,
        depth = outcome.depth,
        nodes = engine.nodes_searched(),
        "search finished"
    );

    let uci = outcome.mv.to_uci(CastlingMode::Standard);
    match uci {
        UciMove::Normal {
            from,
            to,
            promotion,
        } => Ok(WireMove {
            from: from.to_string(),
            to: to.to_string(),
            promotion: promotion.map(|role| role.char()),
        }),
        other => Err(format!("unexpected move shape: {other}")),
    }
}
