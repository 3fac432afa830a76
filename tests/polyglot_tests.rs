use vantage::board::Board;
use vantage::book::compute_polyglot_hash;

// Note: `book/polyglot_keys.rs`'s random table is a deterministic
// substitute (see DESIGN.md), not the published Polyglot constants, so
// these tests check internal consistency of the key schedule rather than
// asserting against the well-known start-position hash
// (0x463b96181691fc9c), which only holds for the original constants.

#[test]
fn hash_is_deterministic_for_the_same_position() {
    let board = Board::new();
    assert_eq!(compute_polyglot_hash(&board), compute_polyglot_hash(&board));
}

#[test]
fn hash_changes_after_a_move() {
    use vantage::moves::execute::make_move_basic;
    use vantage::moves::magic::loader::load_magic_tables;
    use vantage::moves::types::Move;
    use vantage::square::Square;

    let tables = load_magic_tables();
    let mut board = Board::new();
    let before = compute_polyglot_hash(&board);

    let mut moves = Vec::new();
    let mut scratch = Vec::new();
    vantage::moves::execute::generate_legal(&mut board, &tables, &mut moves, &mut scratch);
    let e2e4 = moves
        .iter()
        .find(|m: &&Move| m.from == Square::from_index(12) && m.to == Square::from_index(28))
        .copied()
        .expect("e2e4 should be legal from startpos");

    make_move_basic(&mut board, e2e4);
    let after = compute_polyglot_hash(&board);

    assert_ne!(before, after);
}

#[test]
fn side_to_move_toggles_the_turn_key() {
    let mut white_to_move = Board::new();
    white_to_move.side_to_move = vantage::board::Color::Black;
    let black = compute_polyglot_hash(&white_to_move);

    white_to_move.side_to_move = vantage::board::Color::White;
    let white = compute_polyglot_hash(&white_to_move);

    assert_ne!(black, white);
}
