//! Conversation store

use advisor_core::Turn;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::window::ConversationWindow;
use crate::StoreError;

/// Durable-or-surfaced conversation persistence
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn to a room's log
    async fn append(&self, room_id: &str, turn: Turn) -> Result<(), StoreError>;

    /// Read a room's full log in chronological order
    async fn read(&self, room_id: &str) -> Result<Vec<Turn>, StoreError>;

    /// Compute the token-budget window for a room
    ///
    /// Scans newest-first, accumulating token counts until the next turn
    /// would exceed the budget, then returns the included turns in
    /// chronological order.
    async fn window(
        &self,
        room_id: &str,
        token_budget: usize,
    ) -> Result<ConversationWindow, StoreError> {
        let turns = self.read(room_id).await?;
        Ok(ConversationWindow::from_history(&turns, token_budget))
    }
}

/// In-memory store
///
/// Each room's log sits behind its own lock, so appends for one room are
/// serialized while independent rooms proceed in parallel.
pub struct InMemoryStore {
    rooms: DashMap<String, Arc<RwLock<Vec<Turn>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn room(&self, room_id: &str) -> Arc<RwLock<Vec<Turn>>> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Vec::new())))
            .clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn append(&self, room_id: &str, turn: Turn) -> Result<(), StoreError> {
        let room = self.room(room_id);
        room.write().push(turn);
        Ok(())
    }

    async fn read(&self, room_id: &str) -> Result<Vec<Turn>, StoreError> {
        match self.rooms.get(room_id) {
            Some(room) => Ok(room.read().clone()),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::TurnRole;

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let store = InMemoryStore::new();
        store.append("r1", Turn::user("câu hỏi 1")).await.unwrap();
        store.append("r1", Turn::assistant("trả lời 1")).await.unwrap();
        store.append("r1", Turn::user("câu hỏi 2")).await.unwrap();

        let turns = store.read("r1").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "câu hỏi 1");
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(turns[2].content, "câu hỏi 2");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let store = InMemoryStore::new();
        store.append("r1", Turn::user("phòng một")).await.unwrap();
        store.append("r2", Turn::user("phòng hai")).await.unwrap();

        let r1 = store.read("r1").await.unwrap();
        let r2 = store.read("r2").await.unwrap();
        assert_eq!(r1.len(), 1);
        assert_eq!(r2.len(), 1);
        assert_ne!(r1[0].content, r2[0].content);
    }

    #[tokio::test]
    async fn test_unknown_room_reads_empty() {
        let store = InMemoryStore::new();
        assert!(store.read("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_same_room_all_land() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append("r1", Turn::user(format!("tin {}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.read("r1").await.unwrap().len(), 50);
    }
}
