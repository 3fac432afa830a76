use super::*;

#[test]
fn new_board_has_standard_starting_material() {
    let board = Board::new();
    assert_eq!(board.pieces(Piece::Pawn, Color::White).count_ones(), 8);
    assert_eq!(board.pieces(Piece::Pawn, Color::Black).count_ones(), 8);
    assert_eq!(board.pieces(Piece::King, Color::White).count_ones(), 1);
    assert_eq!(board.pieces(Piece::King, Color::Black).count_ones(), 1);
    assert_eq!(board.side_to_move, Color::White);
    assert!(board.validate().is_ok());
}

#[test]
fn new_board_castling_rights_all_set() {
    let board = Board::new();
    assert!(board.has_kingside_castle(Color::White));
    assert!(board.has_queenside_castle(Color::White));
    assert!(board.has_kingside_castle(Color::Black));
    assert!(board.has_queenside_castle(Color::Black));
}

#[test]
fn new_empty_board_has_no_pieces() {
    let board = Board::new_empty();
    assert_eq!(board.occupied(), 0);
    for sq_idx in 0..64u8 {
        assert!(board.piece_at(Square::from_index(sq_idx)).is_none());
    }
}

#[test]
fn set_bb_updates_occupancy_and_zobrist() {
    let mut board = Board::new_empty();
    let before = board.zobrist;
    board.set_bb(Color::White, Piece::Pawn, 1u64 << 12);
    assert_eq!(board.occ_white, 1u64 << 12);
    assert_eq!(board.occ_all, 1u64 << 12);
    assert_ne!(board.zobrist, before);
    assert_eq!(
        board.piece_at(Square::from_index(12)),
        Some((Color::White, Piece::Pawn))
    );
}

#[test]
fn king_square_matches_king_bitboard() {
    let board = Board::new();
    assert_eq!(board.king_square(Color::White), Square::from_index(4));
    assert_eq!(board.king_square(Color::Black), Square::from_index(60));
}

#[test]
fn zobrist_is_self_consistent_after_setup() {
    let board = Board::new();
    assert_eq!(board.zobrist, board.compute_zobrist_full());
}

#[test]
fn repetition_count_starts_at_one_for_fresh_position() {
    let board = Board::new();
    assert_eq!(board.repetition_count(), 1);
    assert!(!board.is_threefold());
}

#[test]
fn repetition_count_grows_with_matching_history_entries() {
    let mut board = Board::new();
    board.history.push(board.zobrist);
    board.history.push(board.zobrist);
    assert_eq!(board.repetition_count(), 3);
    assert!(board.is_threefold());
}

#[test]
fn default_matches_new_empty() {
    assert_eq!(Board::default(), Board::new_empty());
}

#[test]
fn display_and_from_str_round_trip_through_fen() {
    let board = Board::new();
    let rendered = board.to_string();
    let parsed: Board = rendered.parse().expect("starting FEN should parse");
    assert_eq!(parsed, board);
}
