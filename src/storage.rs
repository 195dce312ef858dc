//! Game persistence. The orchestrator writes snapshots fire-and-forget;
//! a failed write is logged and never blocks play.

use crate::error::PersistenceError;
use crate::game::memory::CoachingMemory;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A persisted game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub game_id: String,
    pub owner: String,
    pub fen: String,
    pub history: Vec<String>,
    pub memory: CoachingMemory,
    pub active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Snapshot written after each completed turn. `active` is only set when
/// a game ends or is abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameUpdate {
    pub fen: String,
    pub history: Vec<String>,
    pub memory: CoachingMemory,
    pub active: Option<bool>,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Creates a new active game for the owner, deactivating any previous
    /// active game they had. Returns the new game id.
    async fn create_game(&self, owner: &str) -> Result<String, PersistenceError>;

    async fn update_game(&self, game_id: &str, update: GameUpdate) -> Result<(), PersistenceError>;

    /// The owner's current active game, if any.
    async fn get_active_game(&self, owner: &str) -> Result<Option<SavedGame>, PersistenceError>;
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// In-process store over a concurrent map, keyed by game id.
#[derive(Default)]
pub struct MemoryStore {
    games: DashMap<String, SavedGame>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_game(&self, owner: &str) -> Result<String, PersistenceError> {
        // One active game per owner.
        for mut entry in self.games.iter_mut() {
            if entry.owner == owner && entry.active {
                entry.active = false;
                entry.updated_at = now_millis();
            }
        }

        let game_id = Uuid::new_v4().to_string();
        let now = now_millis();
        self.games.insert(
            game_id.clone(),
            SavedGame {
                game_id: game_id.clone(),
                owner: owner.to_string(),
                fen: String::new(),
                history: Vec::new(),
                memory: CoachingMemory::empty(),
                active: true,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(game_id)
    }

    async fn update_game(&self, game_id: &str, update: GameUpdate) -> Result<(), PersistenceError> {
        let mut entry = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| PersistenceError::NotFound(game_id.to_string()))?;
        entry.fen = update.fen;
        entry.history = update.history;
        entry.memory = update.memory;
        if let Some(active) = update.active {
            entry.active = active;
        }
        entry.updated_at = now_millis();
        Ok(())
    }

    async fn get_active_game(&self, owner: &str) -> Result<Option<SavedGame>, PersistenceError> {
        let mut found: Option<SavedGame> = None;
        for entry in self.games.iter() {
            if entry.owner == owner && entry.active {
                match &found {
                    Some(existing) if existing.updated_at >= entry.updated_at => {}
                    _ => found = Some(entry.clone()),
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(fen: &str, history: &[&str]) -> GameUpdate {
        GameUpdate {
            fen: fen.to_string(),
            history: history.iter().map(|s| s.to_string()).collect(),
            memory: CoachingMemory::empty(),
            active: None,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_active_game() {
        let store = MemoryStore::new();
        let id = store.create_game("alice").await.expect("creates");
        store
            .update_game(&id, update("fen-after-e4", &["e2e4"]))
            .await
            .expect("updates");

        let saved = store
            .get_active_game("alice")
            .await
            .expect("fetches")
            .expect("exists");
        assert_eq!(saved.game_id, id);
        assert_eq!(saved.fen, "fen-after-e4");
        assert_eq!(saved.history, vec!["e2e4".to_string()]);
        assert!(saved.active);
    }

    #[tokio::test]
    async fn new_game_deactivates_the_previous_one() {
        let store = MemoryStore::new();
        let first = store.create_game("alice").await.expect("creates");
        let second = store.create_game("alice").await.expect("creates");

        let active = store
            .get_active_game("alice")
            .await
            .expect("fetches")
            .expect("exists");
        assert_eq!(active.game_id, second);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn owners_do_not_see_each_other() {
        let store = MemoryStore::new();
        store.create_game("alice").await.expect("creates");
        let none = store.get_active_game("bob").await.expect("fetches");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn updating_an_unknown_game_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_game("missing", update("fen", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
    }

    #[tokio::test]
    async fn marking_inactive_hides_the_game() {
        let store = MemoryStore::new();
        let id = store.create_game("alice").await.expect("creates");
        store
            .update_game(
                &id,
                GameUpdate {
                    fen: "final".to_string(),
                    history: Vec::new(),
                    memory: CoachingMemory::empty(),
                    active: Some(false),
                },
            )
            .await
            .expect("updates");
        assert!(store
            .get_active_game("alice")
            .await
            .expect("fetches")
            .is_none());
    }
}
