use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, Color, EMPTY_SQ};
use crate::square::Square;
use std::str::FromStr;

impl Board {
    /// Parses a FEN string and overwrites `self` with the position it
    /// describes. On error `self` is left in an unspecified partial state,
    /// same as the teacher's other `Result`-returning parsers - callers
    /// that need to keep the old board on failure should clone first.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN missing piece placement field")?;
        let side = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        self.piece_bb = [[0u64; 6]; 2];
        self.occ_white = 0;
        self.occ_black = 0;
        self.occ_all = 0;
        self.piece_on_sq = [EMPTY_SQ; 64];
        self.history.clear();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN piece placement must have 8 ranks, found {}",
                ranks.len()
            ));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                if file >= 8 {
                    return Err(format!("FEN rank '{}' overflows the board", rank_str));
                }
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or_else(|| format!("invalid FEN piece glyph '{}'", ch))?;
                let sq = Square::from_file_rank(file as u8, rank as u8);
                let bb = self.bb(color, piece) | (1u64 << sq.index());
                self.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(format!("FEN rank '{}' does not cover 8 files", rank_str));
            }
        }

        self.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid FEN side to move '{}'", other)),
        };

        self.castling_rights = 0;
        if castling != "-" {
            for ch in castling.chars() {
                self.castling_rights |= match ch {
                    'K' => super::CASTLE_WK,
                    'Q' => super::CASTLE_WQ,
                    'k' => super::CASTLE_BK,
                    'q' => super::CASTLE_BQ,
                    other => return Err(format!("invalid FEN castling glyph '{}'", other)),
                };
            }
        }

        self.en_passant = if ep == "-" {
            None
        } else {
            Some(Square::from_str(ep).map_err(|_| format!("invalid FEN en passant square '{}'", ep))?)
        };

        self.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("invalid FEN halfmove clock '{}'", halfmove))?;
        self.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("invalid FEN fullmove number '{}'", fullmove))?;

        self.refresh_zobrist();
        Ok(())
    }

    /// Renders the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.castling_rights & super::CASTLE_WK != 0 {
            castling.push('K');
        }
        if self.castling_rights & super::CASTLE_WQ != 0 {
            castling.push('Q');
        }
        if self.castling_rights & super::CASTLE_BK != 0 {
            castling.push('k');
        }
        if self.castling_rights & super::CASTLE_BQ != 0 {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}
