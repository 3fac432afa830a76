//! Background search driver for the UCI loop.
//!
//! The teacher's `bin/cli.rs` blocks the UCI-reading thread inside
//! `search()` for the whole `go` call, so `stop`/`ponderhit`/`quit` can't be
//! read until the search itself notices its time limit. `EngineDriver`
//! spawns the search on its own thread with a cloned board and a shared
//! stop flag, so the UCI loop's `stdin` reads stay live for the whole move.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::board::Board;
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::eval_cache::EvalCache;
use crate::search::search::{SearchInfo, search_cancellable};
use crate::search::tt::TranspositionTable;

/// Result of a completed (or stopped) `go`.
#[derive(Clone, Copy, Debug)]
pub struct SearchResult {
    pub score: i32,
    pub best_move: Option<Move>,
}

/// Owns engine-wide state that must survive across `go` calls: the board,
/// caches, and the cooperative stop flag the search thread polls. One
/// `EngineDriver` per UCI session.
pub struct EngineDriver {
    board: Board,
    tables: Arc<MagicTables>,
    tt: Arc<Mutex<TranspositionTable>>,
    eval_cache: Arc<Mutex<EvalCache>>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<SearchResult>>,
}

impl EngineDriver {
    pub fn new(tables: MagicTables, hash_mb: usize) -> Self {
        Self {
            board: Board::new(),
            tables: Arc::new(tables),
            tt: Arc::new(Mutex::new(TranspositionTable::new(hash_mb))),
            eval_cache: Arc::new(Mutex::new(EvalCache::new((hash_mb / 4).max(1)))),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tables(&self) -> &MagicTables {
        &self.tables
    }

    pub fn set_board(&mut self, board: Board) {
        self.abort_and_join();
        self.board = board;
    }

    pub fn new_game(&mut self) {
        self.abort_and_join();
        self.board = Board::new();
        if let Ok(mut tt) = self.tt.lock() {
            tt.clear();
        }
        if let Ok(mut cache) = self.eval_cache.lock() {
            cache.clear();
        }
    }

    pub fn resize_hash(&mut self, hash_mb: usize) {
        self.abort_and_join();
        self.tt = Arc::new(Mutex::new(TranspositionTable::new(hash_mb)));
        self.eval_cache = Arc::new(Mutex::new(EvalCache::new((hash_mb / 4).max(1))));
    }

    /// True while a `go` search thread is still running.
    pub fn is_searching(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the search on its own thread. `on_info` runs on the *worker*
    /// thread, so implementations must be `Send` and should not block.
    pub fn go(
        &mut self,
        max_depth: i32,
        time_limit: Option<Duration>,
        on_info: impl FnMut(SearchInfo) + Send + 'static,
    ) {
        self.abort_and_join();
        self.stop_flag.store(false, Ordering::SeqCst);

        let mut board = self.board.clone();
        let tables = Arc::clone(&self.tables);
        let stop_flag = Arc::clone(&self.stop_flag);
        let tt = Arc::clone(&self.tt);
        let eval_cache = Arc::clone(&self.eval_cache);

        tracing::debug!(max_depth, ?time_limit, "spawning search thread");

        self.worker = Some(std::thread::spawn(move || {
            let mut tt_guard = tt.lock().unwrap_or_else(|e| e.into_inner());
            let mut eval_cache_guard = eval_cache.lock().unwrap_or_else(|e| e.into_inner());

            let (score, best_move) = search_cancellable(
                &mut board,
                &tables,
                max_depth,
                time_limit,
                Some(stop_flag),
                &mut tt_guard,
                &mut eval_cache_guard,
                on_info,
            );

            SearchResult { score, best_move }
        }));
    }

    /// Signal the running search to stop and block until it does.
    pub fn stop(&mut self) -> Option<SearchResult> {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.join()
    }

    /// Block until the current search finishes, returning its result.
    pub fn join(&mut self) -> Option<SearchResult> {
        self.worker.take().and_then(|handle| handle.join().ok())
    }

    fn abort_and_join(&mut self) {
        if self.worker.is_some() {
            self.stop_flag.store(true, Ordering::SeqCst);
            self.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::precompute::{MagicTableSeed, generate_magic_tables};
    use std::sync::mpsc;

    fn test_tables() -> MagicTables {
        generate_magic_tables(MagicTableSeed::Fixed(0xD12E_5EED)).expect("magic table generation")
    }

    #[test]
    fn go_returns_a_move_for_the_start_position() {
        let mut driver = EngineDriver::new(test_tables(), 4);
        driver.go(4, Some(Duration::from_millis(200)), |_| {});
        let result = driver.join().expect("search thread should finish");
        assert!(result.best_move.is_some());
    }

    #[test]
    fn stop_halts_a_deep_search_promptly() {
        let mut driver = EngineDriver::new(test_tables(), 4);
        driver.go(64, None, |_| {});
        std::thread::sleep(Duration::from_millis(20));
        let result = driver.stop();
        assert!(result.is_some());
        assert!(!driver.is_searching());
    }

    #[test]
    fn info_callback_is_invoked_at_least_once() {
        let mut driver = EngineDriver::new(test_tables(), 4);
        let (tx, rx) = mpsc::channel();
        driver.go(3, Some(Duration::from_millis(200)), move |info| {
            let _ = tx.send(info.depth);
        });
        driver.join();
        assert!(rx.try_iter().count() > 0);
    }
}
