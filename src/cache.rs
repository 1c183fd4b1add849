//! Entity Cache
//!
//! TTL cache over the board hierarchy with three partitions: all boards,
//! lists per board, cards per list. Entries expire `ttl` after they were
//! fetched; writes through the executor also invalidate the affected
//! partition explicitly.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::model::{Board, BoardList, Card};

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
}

/// A cached collection and when it was fetched
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub payload: Arc<Vec<T>>,
    pub fetched_at: Instant,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> CacheEntry<T> {
    fn new(items: Vec<T>) -> Self {
        Self {
            payload: Arc::new(items),
            fetched_at: Instant::now(),
        }
    }
}

/// Partition key for the single "all boards" entry
const ALL_BOARDS: &str = "*";

/// Session-scoped cache of boards, lists and cards
#[derive(Clone)]
pub struct EntityCache {
    boards: Cache<String, CacheEntry<Board>>,
    lists: Cache<String, CacheEntry<BoardList>>,
    cards: Cache<String, CacheEntry<Card>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

fn partition<T: Send + Sync + 'static>(ttl: Duration) -> Cache<String, CacheEntry<T>> {
    Cache::builder().max_capacity(10_000).time_to_live(ttl).build()
}

impl EntityCache {
    /// Create new cache with TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            boards: partition(ttl),
            lists: partition(ttl),
            cards: partition(ttl),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn record<T>(&self, partition: &str, key: &str, entry: Option<CacheEntry<T>>) -> Option<Arc<Vec<T>>> {
        match entry {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cache HIT: {}/{} (age {:?})",
                    partition,
                    key,
                    entry.fetched_at.elapsed()
                );
                Some(entry.payload)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache MISS: {}/{}", partition, key);
                None
            }
        }
    }

    pub async fn boards(&self) -> Option<Arc<Vec<Board>>> {
        let entry = self.boards.get(ALL_BOARDS).await;
        self.record("boards", ALL_BOARDS, entry)
    }

    pub async fn set_boards(&self, boards: Vec<Board>) -> Arc<Vec<Board>> {
        let entry = CacheEntry::new(boards);
        let payload = Arc::clone(&entry.payload);
        self.boards.insert(ALL_BOARDS.to_string(), entry).await;
        payload
    }

    pub async fn lists(&self, board_id: &str) -> Option<Arc<Vec<BoardList>>> {
        let entry = self.lists.get(board_id).await;
        self.record("lists", board_id, entry)
    }

    pub async fn set_lists(&self, board_id: &str, lists: Vec<BoardList>) -> Arc<Vec<BoardList>> {
        let entry = CacheEntry::new(lists);
        let payload = Arc::clone(&entry.payload);
        self.lists.insert(board_id.to_string(), entry).await;
        payload
    }

    pub async fn cards(&self, list_id: &str) -> Option<Arc<Vec<Card>>> {
        let entry = self.cards.get(list_id).await;
        self.record("cards", list_id, entry)
    }

    pub async fn set_cards(&self, list_id: &str, cards: Vec<Card>) -> Arc<Vec<Card>> {
        let entry = CacheEntry::new(cards);
        let payload = Arc::clone(&entry.payload);
        self.cards.insert(list_id.to_string(), entry).await;
        payload
    }

    pub async fn invalidate_boards(&self) {
        self.boards.invalidate(ALL_BOARDS).await;
        debug!("Cache INVALIDATE: boards");
    }

    pub async fn invalidate_lists(&self, board_id: &str) {
        self.lists.invalidate(board_id).await;
        debug!("Cache INVALIDATE: lists/{}", board_id);
    }

    pub async fn invalidate_cards(&self, list_id: &str) {
        self.cards.invalidate(list_id).await;
        debug!("Cache INVALIDATE: cards/{}", list_id);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            entries: self.boards.entry_count() + self.lists.entry_count() + self.cards.entry_count(),
            hits,
            misses,
            hit_rate_percent: if total > 0 {
                (hits as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        }
    }

    /// Clear all entries
    pub async fn clear(&self) {
        self.boards.invalidate_all();
        self.lists.invalidate_all();
        self.cards.invalidate_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
