//! Terminal front end: play White against the engine, with coaching
//! printed after each completed turn.

use chess_mentor::{
    EngineHandle, EngineMove, GameSession, MemoryStore, OfflineAdvisor, StandardOracle,
    TurnOutcome, SEARCH_DEPTH,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_mentor=info".into()),
        )
        .init();

    let engine = Arc::new(EngineHandle::spawn());
    let advisor = Arc::new(OfflineAdvisor);
    let store = Arc::new(MemoryStore::new());
    let mut session = GameSession::new(
        Box::new(StandardOracle::new()),
        engine,
        advisor,
        store,
        "local",
        SEARCH_DEPTH,
    );

    session.ensure_saved().await;
    session.reset_game().await;
    println!("chess-mentor: enter moves as UCI (e2e4), 'new' to restart, 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_board_line(&session);
    while let Ok(Some(line)) = lines.next_line().await {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "new" => {
                session.reset_game().await;
                if let Some(note) = &session.ui().notification {
                    println!("{note}");
                }
                print_board_line(&session);
                continue;
            }
            _ => {}
        }

        let Some(mv) = EngineMove::from_uci(input) else {
            println!("could not parse '{input}' - expected UCI like e2e4 or e7e8q");
            continue;
        };

        match session.submit_move(mv).await {
            Ok(TurnOutcome::Playing { reply }) => {
                println!("engine plays {} ({})", reply.uci(), reply.san);
                if let Some(analysis) = session.latest_analysis().await {
                    println!("coach suggests: {} - {}", analysis.best_move, analysis.explanation);
                }
                print_board_line(&session);
            }
            Ok(TurnOutcome::Finished { reply }) => {
                if let Some(reply) = reply {
                    println!("engine plays {} ({})", reply.uci(), reply.san);
                }
                if let Some(note) = &session.ui().notification {
                    println!("{note}");
                }
                print_board_line(&session);
            }
            Err(err) => {
                println!("{err}");
            }
        }
    }
}

fn print_board_line(session: &GameSession) {
    println!("position: {}", session.fen());
}
