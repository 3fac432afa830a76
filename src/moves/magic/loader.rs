//! Entry point the rest of the engine uses to get a ready `MagicTables`.
//!
//! Under the `load_magic` feature this first tries to deserialize a
//! bundled bincode blob from disk so startup skips the magic search;
//! it falls back to generating fresh tables if the blob is absent or
//! stale. Without the feature it always generates fresh.

use super::precompute::{generate_magic_tables, MagicTableSeed};
use super::structs::MagicTables;

#[cfg(feature = "deterministic_magic")]
const DETERMINISTIC_SEED: u64 = 0x5EED_1234_ABCD_0001;

#[cfg(feature = "load_magic")]
const MAGIC_BLOB_PATH: &str = "magic_tables.bin";

fn seed() -> MagicTableSeed {
    #[cfg(feature = "deterministic_magic")]
    {
        MagicTableSeed::Fixed(DETERMINISTIC_SEED)
    }
    #[cfg(not(feature = "deterministic_magic"))]
    {
        MagicTableSeed::Random
    }
}

#[cfg(feature = "load_magic")]
fn load_bundled() -> Option<MagicTables> {
    let bytes = std::fs::read(MAGIC_BLOB_PATH).ok()?;
    bincode::deserialize(&bytes).ok()
}

/// Returns a ready-to-use set of rook/bishop magic tables, generating
/// them if no usable bundled blob is available.
pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        if let Some(tables) = load_bundled() {
            return tables;
        }
        tracing::warn!(
            path = MAGIC_BLOB_PATH,
            "no bundled magic table blob found, generating fresh tables"
        );
    }

    generate_magic_tables(seed()).expect("magic number search should always converge")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_magic_tables_produces_consistent_queen_attacks() {
        let tables = load_magic_tables();
        // d4 empty board: queen attacks should equal rook | bishop from an
        // empty board, sanity-checking the freshly built tables line up.
        let rook = tables.rook.get_attacks(27, 0);
        let bishop = tables.bishop.get_attacks(27, 0);
        assert_eq!(tables.queen_attacks(27, 0), rook | bishop);
    }
}
