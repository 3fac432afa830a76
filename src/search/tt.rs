use crate::moves::types::Move;

// Make sure MATE_THRESHOLD matches what we define in search.rs (30000)
pub const MATE_THRESHOLD: i32 = 30000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeType {
    Exact = 0,
    LowerBound = 1, // Beta cutoff (failed high)
    UpperBound = 2, // Alpha cutoff (failed low)
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub bound: u8, // 0=Exact, 1=Lower, 2=Upper
    pub generation: u8,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        best_move: None,
        score: 0,
        depth: 0,
        bound: 0,
        generation: 0,
    };

    fn is_empty(&self) -> bool {
        self.key == 0 && self.best_move.is_none() && self.depth == 0
    }

    /// Folds every payload field into one word. `key` is stored as
    /// `zobrist ^ checksum()`, so a probe that reconstructs the checksum
    /// from the fields it just read and finds it doesn't cancel back to a
    /// plausible zobrist key knows the slot was torn by a concurrent write
    /// (two threads racing the same index without a lock) rather than
    /// trusting a read that happened to land between two half-written
    /// fields.
    fn checksum(&self) -> u64 {
        let mv = self.best_move.unwrap_or(Move {
            from: crate::square::Square::from_index(0),
            to: crate::square::Square::from_index(0),
            piece: crate::board::Piece::Pawn,
            promotion: None,
            flags: 0,
        });
        let promo_bits = match mv.promotion {
            None => 0u64,
            Some(p) => 1 + p as u64,
        };
        let mut h = 0x9E37_79B9_7F4A_7C15u64;
        h = h.wrapping_mul(31) ^ (mv.from.index() as u64);
        h = h.wrapping_mul(31) ^ (mv.to.index() as u64);
        h = h.wrapping_mul(31) ^ (mv.piece as u64);
        h = h.wrapping_mul(31) ^ promo_bits;
        h = h.wrapping_mul(31) ^ (mv.flags as u64);
        h = h.wrapping_mul(31) ^ (self.score as u16 as u64);
        h = h.wrapping_mul(31) ^ (self.depth as u64);
        h = h.wrapping_mul(31) ^ (self.bound as u64);
        h = h.wrapping_mul(31) ^ (self.generation as u64);
        h
    }
}

/// Two entries per index: one kept only while it holds the deepest search
/// seen so far, one always overwritten. Mirrors the classic two-tier
/// replacement scheme used to avoid evicting valuable deep entries with
/// a flood of shallow ones from quiescence/ordering probes.
#[derive(Clone, Copy)]
struct Bucket {
    depth_preferred: TTEntry,
    always_replace: TTEntry,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        depth_preferred: TTEntry::EMPTY,
        always_replace: TTEntry::EMPTY,
    };
}

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    pub generation: u8,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Bucket>();
        let num_buckets = (size_mb * 1024 * 1024) / entry_size;

        // Round down to power of 2
        let mut capacity = 1;
        while capacity * 2 <= num_buckets {
            capacity *= 2;
        }
        capacity = capacity.max(1);

        Self {
            buckets: vec![Bucket::EMPTY; capacity],
            generation: 0,
        }
    }

    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            *bucket = Bucket::EMPTY;
        }
        self.generation = 0;
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) & (self.buckets.len() - 1)
    }

    pub fn save(
        &mut self,
        key: u64,
        mv: Option<Move>,
        score: i32,
        depth: u8,
        bound: u8,
        _ply: i32,
    ) {
        let score_i16 = score.clamp(-32000, 32000) as i16;
        let idx = self.index(key);
        let bucket = &mut self.buckets[idx];

        let candidate_move = |existing: &TTEntry| {
            if mv.is_some() {
                mv
            } else if !existing.is_empty() && existing.key ^ existing.checksum() == key {
                existing.best_move
            } else {
                None
            }
        };

        let preferred = &bucket.depth_preferred;
        let preferred_matches = !preferred.is_empty() && preferred.key ^ preferred.checksum() == key;
        let should_replace_preferred = preferred.is_empty()
            || preferred_matches
            || depth >= preferred.depth
            || preferred.generation != self.generation;

        if should_replace_preferred {
            let best_move = candidate_move(preferred);
            let mut entry = TTEntry {
                key: 0,
                best_move,
                score: score_i16,
                depth,
                bound,
                generation: self.generation,
            };
            entry.key = key ^ entry.checksum();
            bucket.depth_preferred = entry;
        } else {
            let best_move = candidate_move(&bucket.always_replace);
            let mut entry = TTEntry {
                key: 0,
                best_move,
                score: score_i16,
                depth,
                bound,
                generation: self.generation,
            };
            entry.key = key ^ entry.checksum();
            bucket.always_replace = entry;
        }
    }

    pub fn probe(
        &self,
        key: u64,
        _depth: u8,
        _alpha: i32,
        _beta: i32,
        _ply: i32,
    ) -> Option<(Option<Move>, i32, u8, u8)> {
        let idx = self.index(key);
        let bucket = &self.buckets[idx];

        for slot in [&bucket.depth_preferred, &bucket.always_replace] {
            if slot.is_empty() {
                continue;
            }
            if slot.key ^ slot.checksum() == key {
                return Some((slot.best_move, slot.score as i32, slot.depth, slot.bound));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;
    use crate::square::Square;

    fn mv() -> Move {
        Move {
            from: Square::from_index(12),
            to: Square::from_index(28),
            piece: Piece::Pawn,
            promotion: None,
            flags: 0,
        }
    }

    #[test]
    fn probe_after_save_returns_stored_entry() {
        let mut tt = TranspositionTable::new(1);
        tt.save(0x1234, Some(mv()), 55, 4, NodeType::Exact as u8, 0);
        let (stored_mv, score, depth, bound) = tt.probe(0x1234, 4, -1000, 1000, 0).unwrap();
        assert_eq!(stored_mv, Some(mv()));
        assert_eq!(score, 55);
        assert_eq!(depth, 4);
        assert_eq!(bound, NodeType::Exact as u8);
    }

    #[test]
    fn probe_miss_on_different_key() {
        let mut tt = TranspositionTable::new(1);
        tt.save(0x1234, Some(mv()), 55, 4, NodeType::Exact as u8, 0);
        assert!(tt.probe(0x5678, 4, -1000, 1000, 0).is_none());
    }

    #[test]
    fn shallow_write_does_not_evict_deeper_depth_preferred_slot() {
        let mut tt = TranspositionTable::new(1);
        tt.save(0x1234, Some(mv()), 10, 10, NodeType::Exact as u8, 0);
        tt.save(0x1234, None, -5, 2, NodeType::UpperBound as u8, 0);

        let idx = tt.index(0x1234);
        assert_eq!(tt.buckets[idx].depth_preferred.depth, 10);
        assert_eq!(tt.buckets[idx].always_replace.depth, 2);
    }

    #[test]
    fn new_search_bumps_generation_and_allows_shallow_overwrite() {
        let mut tt = TranspositionTable::new(1);
        tt.save(0x1234, Some(mv()), 10, 10, NodeType::Exact as u8, 0);
        tt.new_search();
        tt.save(0x1234, None, -5, 1, NodeType::UpperBound as u8, 0);

        let idx = tt.index(0x1234);
        assert_eq!(tt.buckets[idx].depth_preferred.depth, 1);
    }

    #[test]
    fn clear_resets_every_bucket() {
        let mut tt = TranspositionTable::new(1);
        tt.save(0x1234, Some(mv()), 10, 10, NodeType::Exact as u8, 0);
        tt.clear();
        assert!(tt.probe(0x1234, 10, -1000, 1000, 0).is_none());
    }
}
