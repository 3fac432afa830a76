//! Zobrist-keyed cache of static evaluation scores.
//!
//! `static_eval` in `eval.rs` walks pawn structure, king safety, mobility,
//! and tropism terms every call; this cache lets repeated positions (the
//! same leaf reached via different move orders, or re-evaluated during
//! quiescence) skip straight to the cached centipawn score. Mirrors
//! `tt.rs`'s bucket/XOR design, minus the move/bound/depth payload.

#[derive(Clone, Copy)]
struct Slot {
    key: u64,
    score: i32,
}

impl Slot {
    const EMPTY: Slot = Slot { key: 0, score: 0 };

    fn is_empty(&self) -> bool {
        self.key == 0 && self.score == 0
    }

    fn checksum(&self) -> u64 {
        (self.score as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

#[derive(Clone, Copy)]
struct Bucket {
    recent: Slot,
    always_replace: Slot,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        recent: Slot::EMPTY,
        always_replace: Slot::EMPTY,
    };
}

pub struct EvalCache {
    buckets: Vec<Bucket>,
}

impl EvalCache {
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Bucket>();
        let num_buckets = (size_mb * 1024 * 1024) / entry_size;

        let mut capacity = 1;
        while capacity * 2 <= num_buckets {
            capacity *= 2;
        }
        capacity = capacity.max(1);

        Self {
            buckets: vec![Bucket::EMPTY; capacity],
        }
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            *bucket = Bucket::EMPTY;
        }
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) & (self.buckets.len() - 1)
    }

    pub fn store(&mut self, key: u64, score: i32) {
        let idx = self.index(key);
        let bucket = &mut self.buckets[idx];
        let mut slot = Slot { key: 0, score };
        slot.key = key ^ slot.checksum();

        // Always keep the newest write in `recent`; the previous occupant
        // slides into `always_replace` so a second distinct key hashing
        // to the same bucket isn't immediately evicted on the next probe.
        bucket.always_replace = bucket.recent;
        bucket.recent = slot;
    }

    pub fn probe(&self, key: u64) -> Option<i32> {
        let idx = self.index(key);
        let bucket = &self.buckets[idx];

        for slot in [&bucket.recent, &bucket.always_replace] {
            if slot.is_empty() {
                continue;
            }
            if slot.key ^ slot.checksum() == key {
                return Some(slot.score);
            }
        }
        None
    }
}
