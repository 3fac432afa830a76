//! UCI text protocol: line parsing and time-control allocation.
//!
//! Factored out of the teacher's `bin/cli.rs`, which parsed `position`/`go`
//! inline in its stdin loop. Pulling the parsing into pure functions here
//! lets `bin/cli.rs` stay a thin read-dispatch-print loop and lets
//! `EngineDriver` be driven from tests without going through stdin.

use std::fmt;
use std::time::Duration;

use crate::board::Color;

#[derive(Debug)]
pub enum UciError {
    /// `position fen <...>` had a FEN string `Board::from_str` rejected.
    BadFen(String),
    /// A `moves` token in `position` wasn't a legal/parseable move.
    BadMove(String),
    /// `setoption name <name> ...` named an option this engine doesn't have.
    UnknownOption(String),
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::BadFen(fen) => write!(f, "invalid FEN: {}", fen),
            UciError::BadMove(mv) => write!(f, "invalid move: {}", mv),
            UciError::UnknownOption(name) => write!(f, "unknown option: {}", name),
        }
    }
}

impl std::error::Error for UciError {}

/// One parsed `position` command: either startpos or an explicit FEN, plus
/// the trailing `moves` list (still UCI strings; the caller resolves them
/// against a `Board` since that requires move generation).
#[derive(Debug, Clone)]
pub struct PositionCommand {
    pub fen: Option<String>,
    pub moves: Vec<String>,
}

/// One parsed `go` command. Fields are `None`/`false` when absent from the
/// line, matching UCI's all-optional sub-option grammar.
#[derive(Debug, Clone, Default)]
pub struct GoCommand {
    pub depth: Option<i32>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: u64,
    pub binc_ms: u64,
    pub movestogo: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

/// One parsed `setoption name <...> value <...>`.
#[derive(Debug, Clone)]
pub struct SetOptionCommand {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(PositionCommand),
    Go(GoCommand),
    Stop,
    PonderHit,
    SetOption(SetOptionCommand),
    Quit,
    /// Non-UCI extras the teacher's CLI already supported: board display,
    /// FEN dump, and the EPD bench runner.
    Display,
    Fen,
    Bench,
    /// Blank line or a command this engine doesn't recognize; ignored.
    Unknown,
}

/// Parse one line of UCI input. Never errors: unrecognized commands become
/// `UciCommand::Unknown` and are silently ignored by the caller, per the
/// protocol's "ignore what you don't understand" convention.
pub fn parse_line(line: &str) -> UciCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = parts.first() else {
        return UciCommand::Unknown;
    };

    match command {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(parse_position(&parts)),
        "go" => UciCommand::Go(parse_go(&parts)),
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "setoption" => match parse_setoption(&parts) {
            Some(cmd) => UciCommand::SetOption(cmd),
            None => UciCommand::Unknown,
        },
        "quit" => UciCommand::Quit,
        "d" | "display" => UciCommand::Display,
        "fen" => UciCommand::Fen,
        "test" | "bench" => UciCommand::Bench,
        _ => UciCommand::Unknown,
    }
}

fn parse_position(parts: &[&str]) -> PositionCommand {
    let fen = if parts.len() > 1 && parts[1] == "fen" {
        let fen_start = 2;
        let fen_end = parts
            .iter()
            .enumerate()
            .skip(fen_start)
            .find(|(_, &p)| p == "moves")
            .map(|(i, _)| i)
            .unwrap_or(parts.len());
        Some(parts[fen_start..fen_end].join(" "))
    } else {
        None
    };

    let moves = parts
        .iter()
        .position(|&p| p == "moves")
        .map(|idx| parts[idx + 1..].iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    PositionCommand { fen, moves }
}

fn parse_go(parts: &[&str]) -> GoCommand {
    let mut go = GoCommand::default();

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                go.depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "movetime" => {
                go.movetime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "wtime" => {
                go.wtime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "btime" => {
                go.btime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "winc" => {
                go.winc_ms = parts.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                go.binc_ms = parts.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                go.movestogo = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "infinite" => {
                go.infinite = true;
                i += 1;
            }
            "ponder" => {
                go.ponder = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    go
}

fn parse_setoption(parts: &[&str]) -> Option<SetOptionCommand> {
    let name_idx = parts.iter().position(|&p| p == "name")? + 1;
    let value_idx = parts.iter().position(|&p| p == "value");

    let name_end = value_idx.unwrap_or(parts.len());
    if name_idx >= name_end {
        return None;
    }
    let name = parts[name_idx..name_end].join(" ");
    let value = value_idx.map(|idx| parts[idx + 1..].join(" "));

    Some(SetOptionCommand { name, value })
}

/// Engine-wide configuration, set exclusively through `setoption` — there's
/// no separate config-file format (see `ParametersPath` below, which names
/// a file for tuning constants but doesn't define its own format here).
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub ponder: bool,
    pub own_book: bool,
    pub primary_book_path: String,
    pub secondary_book_path: Option<String>,
    pub parameters_path: Option<String>,
    pub uci_opponent: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            hash_mb: 64,
            ponder: false,
            own_book: true,
            primary_book_path: "book.bin".to_string(),
            secondary_book_path: None,
            parameters_path: None,
            uci_opponent: None,
        }
    }
}

impl EngineOptions {
    /// Apply one `setoption` command in place. Returns `Err` for names this
    /// engine doesn't recognize so the caller can report it via `info
    /// string` without silently dropping a GUI's configuration attempt.
    pub fn apply(&mut self, cmd: &SetOptionCommand) -> Result<(), UciError> {
        match cmd.name.as_str() {
            "Hash" => {
                if let Some(v) = cmd.value.as_deref().and_then(|v| v.parse().ok()) {
                    self.hash_mb = v;
                }
            }
            "ClearHash" => {}
            "Ponder" => {
                self.ponder = cmd.value.as_deref() == Some("true");
            }
            "OwnBook" => {
                self.own_book = cmd.value.as_deref() == Some("true");
            }
            "PrimaryBookPath" => {
                if let Some(v) = &cmd.value {
                    self.primary_book_path = v.clone();
                }
            }
            "SecondaryBookPath" => {
                self.secondary_book_path = cmd.value.clone();
            }
            "ParametersPath" => {
                self.parameters_path = cmd.value.clone();
            }
            "UCI_Opponent" => {
                self.uci_opponent = cmd.value.clone();
            }
            other => return Err(UciError::UnknownOption(other.to_string())),
        }
        Ok(())
    }
}

/// Resolve a `go` command into a search depth and time budget, mirroring the
/// teacher's tiered time-allocation scheme: a 15%-or-500ms safety buffer is
/// reserved off the top, allocation is tiered by how much time remains, and
/// a single move is never allowed to spend more than a fifth of what's left.
pub fn resolve_time_control(go: &GoCommand, side_to_move: Color) -> (i32, Option<Duration>) {
    let depth = if go.infinite {
        100
    } else {
        go.depth.unwrap_or(64)
    };

    if go.infinite {
        return (depth, None);
    }

    if let Some(ms) = go.movetime_ms {
        return (depth, Some(Duration::from_millis(ms)));
    }

    let (my_time, my_inc) = match side_to_move {
        Color::White => (go.wtime_ms, go.winc_ms),
        Color::Black => (go.btime_ms, go.binc_ms),
    };

    let Some(t) = my_time else {
        return (depth, None);
    };

    let safety_buffer = (t * 15 / 100).min(500);
    let usable_time = t.saturating_sub(safety_buffer);

    let mut alloc = if let Some(mtg) = go.movestogo {
        let moves_to_plan = mtg.max(2);
        usable_time / moves_to_plan + (my_inc * 3) / 4
    } else if usable_time > 5000 {
        usable_time / 40 + (my_inc * 9) / 10
    } else if usable_time > 2000 {
        usable_time / 30 + (my_inc * 3) / 4
    } else if usable_time > 500 {
        usable_time / 20 + my_inc / 2
    } else {
        my_inc / 2 + 20
    };

    let hard_cap = usable_time / 5;
    alloc = alloc.min(hard_cap).min(usable_time);

    if alloc < 10 && usable_time >= 10 {
        alloc = 10;
    }

    (depth, Some(Duration::from_millis(alloc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position_startpos_with_moves() {
        let cmd = parse_position(&["position", "startpos", "moves", "e2e4", "e7e5"]);
        assert_eq!(cmd.fen, None);
        assert_eq!(cmd.moves, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn parses_position_fen_with_trailing_moves() {
        let line = "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves e2e4";
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parse_position(&parts);
        assert_eq!(
            cmd.fen.as_deref(),
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
        );
        assert_eq!(cmd.moves, vec!["e2e4"]);
    }

    #[test]
    fn parses_go_time_controls() {
        let go = parse_go(&["go", "wtime", "60000", "btime", "60000", "winc", "1000"]);
        assert_eq!(go.wtime_ms, Some(60000));
        assert_eq!(go.winc_ms, 1000);
        assert!(!go.infinite);
    }

    #[test]
    fn parses_setoption_name_and_value() {
        let cmd = parse_setoption(&["setoption", "name", "Hash", "value", "128"]).unwrap();
        assert_eq!(cmd.name, "Hash");
        assert_eq!(cmd.value.as_deref(), Some("128"));
    }

    #[test]
    fn setoption_without_value_is_allowed() {
        let cmd = parse_setoption(&["setoption", "name", "ClearHash"]).unwrap();
        assert_eq!(cmd.name, "ClearHash");
        assert_eq!(cmd.value, None);
    }

    #[test]
    fn movetime_wins_over_clock_based_allocation() {
        let go = GoCommand {
            movetime_ms: Some(2500),
            wtime_ms: Some(60000),
            ..Default::default()
        };
        let (_, limit) = resolve_time_control(&go, Color::White);
        assert_eq!(limit, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn never_allocates_more_than_a_fifth_of_usable_time() {
        let go = GoCommand {
            wtime_ms: Some(10_000),
            movestogo: Some(1),
            ..Default::default()
        };
        let (_, limit) = resolve_time_control(&go, Color::White);
        let usable = 10_000u64.saturating_sub(500);
        assert!(limit.unwrap().as_millis() as u64 <= usable / 5);
    }

    #[test]
    fn setoption_hash_updates_engine_options() {
        let mut opts = EngineOptions::default();
        let cmd = SetOptionCommand {
            name: "Hash".to_string(),
            value: Some("128".to_string()),
        };
        opts.apply(&cmd).unwrap();
        assert_eq!(opts.hash_mb, 128);
    }

    #[test]
    fn unknown_option_name_is_reported() {
        let mut opts = EngineOptions::default();
        let cmd = SetOptionCommand {
            name: "NotARealOption".to_string(),
            value: None,
        };
        assert!(opts.apply(&cmd).is_err());
    }

    #[test]
    fn infinite_search_has_no_time_limit() {
        let go = GoCommand {
            infinite: true,
            ..Default::default()
        };
        let (depth, limit) = resolve_time_control(&go, Color::White);
        assert_eq!(depth, 100);
        assert_eq!(limit, None);
    }
}
