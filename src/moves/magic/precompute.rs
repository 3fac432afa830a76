//! Builds the rook/bishop magic tables from scratch: relevant-occupancy
//! masks, blocker-subset enumeration, magic search, and attack table fill.

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Controls how the PRNG behind the magic-number search is seeded.
pub enum MagicTableSeed {
    /// Seed from the OS entropy source; a fresh run may pick different
    /// (but equally valid) magic numbers.
    Random,
    /// Seed from a fixed value, for reproducible tables and tests.
    Fixed(u64),
}

fn rook_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1 << (rank * 8 + f);
    }
    mask
}

fn bishop_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    let mut r = rank + 1;
    let mut f = file + 1;
    while r <= 6 && f <= 6 {
        mask |= 1 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    let mut r = rank - 1;
    let mut f = file - 1;
    while r >= 1 && f >= 1 {
        mask |= 1 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    let mut r = rank + 1;
    let mut f = file - 1;
    while r <= 6 && f >= 1 {
        mask |= 1 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    let mut r = rank - 1;
    let mut f = file + 1;
    while r >= 1 && f <= 6 {
        mask |= 1 << (r * 8 + f);
        r -= 1;
        f += 1;
    }
    mask
}

/// Enumerates every subset of `mask` (including the empty and full sets)
/// via the standard `(subset - 1) & mask` carry-rippling trick.
fn subsets_of(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        if subset == mask {
            break;
        }
        subset = subset.wrapping_sub(mask) & mask;
    }
    subsets
}

fn build_entry(
    square: usize,
    mask: u64,
    attack_fn: fn(usize, u64) -> u64,
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let blockers = subsets_of(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attack_fn(square, b)).collect();
    let shift = 64 - mask.count_ones();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let size = 1usize << mask.count_ones();
    let mut table = vec![0u64; size];
    for (i, &b) in blockers.iter().enumerate() {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = attacks[i];
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => StdRng::from_rng(&mut rand::rng()),
    };

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let rook_mask = rook_relevant_mask(square);
        rook_entries.push(build_entry(
            square,
            rook_mask,
            rook_attacks_per_square,
            &mut rng,
        )?);

        let bishop_mask = bishop_relevant_mask(square);
        bishop_entries.push(build_entry(
            square,
            bishop_mask,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}
