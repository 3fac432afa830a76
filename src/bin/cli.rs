use vantage::board::{Board, Piece};
use vantage::book::PolyglotBook;
use vantage::driver::EngineDriver;
use vantage::moves::execute::generate_legal;
use vantage::moves::magic::MagicTables;
use vantage::moves::magic::loader::load_magic_tables;
use vantage::moves::types::Move;
use vantage::search::search::search;
use vantage::uci::{self, EngineOptions, GoCommand, UciCommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::mpsc;
use std::time::Duration;

fn main() -> ExitCode {
    #[cfg(feature = "cli")]
    vantage::logger::init_logging("logs/cli.log", "info");

    let magic_tables = match std::panic::catch_unwind(load_magic_tables) {
        Ok(tables) => tables,
        Err(_) => {
            eprintln!("info string fatal: magic table initialization failed");
            return ExitCode::FAILURE;
        }
    };

    let mut options = EngineOptions::default();
    let mut driver = EngineDriver::new(magic_tables, options.hash_mb);
    let mut book = load_book(&options);

    // Read stdin on its own thread so `go` can spawn a search and the main
    // loop keeps polling for `stop`/`ponderhit`/`quit` instead of blocking
    // on the next line while a search runs.
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    if cmd_tx.send(l).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut info_rx: Option<mpsc::Receiver<String>> = None;
    let mut pending_go: Option<GoCommand> = None;
    let mut is_pondering = false;

    loop {
        if let Some(rx) = &info_rx {
            for line in rx.try_iter() {
                println!("{}", line);
            }
            if !driver.is_searching() {
                if let Some(result) = driver.join() {
                    report_bestmove(result.best_move);
                }
                info_rx = None;
                is_pondering = false;
                pending_go = None;
            }
        }

        match cmd_rx.recv_timeout(Duration::from_millis(20)) {
            Ok(line) => match uci::parse_line(&line) {
                UciCommand::Uci => handle_uci(),
                UciCommand::IsReady => println!("readyok"),
                UciCommand::UciNewGame => driver.new_game(),
                UciCommand::Position(cmd) => match resolve_position(&cmd) {
                    Ok(board) => driver.set_board(board),
                    Err(e) => println!("info string {}", e),
                },
                UciCommand::Go(go) => {
                    if go.ponder {
                        // No clock is running yet for this move; search the
                        // pondered line without a deadline until `ponderhit`
                        // tells us the guess was right and the real clock
                        // arithmetic should apply, or `stop` tells us it
                        // was wrong.
                        is_pondering = true;
                        pending_go = Some(go.clone());
                        info_rx = Some(spawn_search(
                            &GoCommand {
                                infinite: true,
                                ..go
                            },
                            &mut driver,
                        ));
                        continue;
                    }
                    if let Some(book_move) = find_book_move(&book, &driver, &go) {
                        println!("info string book move found");
                        println!("bestmove {}", book_move);
                        continue;
                    }
                    info_rx = Some(spawn_search(&go, &mut driver));
                }
                UciCommand::Stop => {
                    if let Some(result) = driver.stop() {
                        report_bestmove(result.best_move);
                    }
                    info_rx = None;
                    is_pondering = false;
                    pending_go = None;
                }
                UciCommand::PonderHit => {
                    // The GUI confirmed our predicted move was played, so
                    // its clock is now running against us for real. Drop the
                    // unbounded pondering search and restart with the time
                    // control the original `go` carried, on the same
                    // position (the TT survives the restart).
                    if is_pondering {
                        driver.stop();
                        info_rx = None;
                        is_pondering = false;
                        if let Some(go) = pending_go.take() {
                            info_rx = Some(spawn_search(&go, &mut driver));
                        }
                    }
                }
                UciCommand::SetOption(cmd) => match options.apply(&cmd) {
                    Ok(()) => {
                        if cmd.name == "ClearHash" {
                            driver.new_game();
                        } else if cmd.name == "Hash" {
                            driver.resize_hash(options.hash_mb);
                        } else if cmd.name == "PrimaryBookPath"
                            || cmd.name == "SecondaryBookPath"
                        {
                            book = load_book(&options);
                        }
                    }
                    Err(e) => println!("info string {}", e),
                },
                UciCommand::Quit => break,
                UciCommand::Display => println!("{}", driver.board()),
                UciCommand::Fen => println!("{}", driver.board().to_fen()),
                UciCommand::Bench => run_epd_tests("bench_arena/bk.epd", &driver),
                UciCommand::Unknown => {}
            },
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    driver.stop();
    ExitCode::SUCCESS
}

fn handle_uci() {
    println!("id name Vantage 1.0");
    println!("id author Vaishak Menon");
    println!("option name Hash type spin default 64 min 1 max 4096");
    println!("option name ClearHash type button");
    println!("option name Ponder type check default false");
    println!("option name OwnBook type check default true");
    println!("option name PrimaryBookPath type string default book.bin");
    println!("option name SecondaryBookPath type string default <empty>");
    println!("option name ParametersPath type string default <empty>");
    println!("option name UCI_Opponent type string default <empty>");
    println!("uciok");
}

fn load_book(options: &EngineOptions) -> Option<PolyglotBook> {
    if !options.own_book {
        return None;
    }
    let book = PolyglotBook::load(&options.primary_book_path)
        .ok()
        .or_else(|| {
            options
                .secondary_book_path
                .as_ref()
                .and_then(|p| PolyglotBook::load(p).ok())
        });

    match &book {
        Some(_) => println!("info string opening book loaded successfully"),
        None => println!("info string no opening book found, running engine only"),
    }
    book
}

fn resolve_position(cmd: &uci::PositionCommand) -> Result<Board, String> {
    let mut board = match &cmd.fen {
        Some(fen) => Board::from_str(fen).map_err(|e| format!("invalid FEN: {}", e))?,
        None => Board::new(),
    };

    // A real `MagicTables` is needed to resolve ambiguous UCI move strings
    // (captures/promotions share a destination square with quiet moves), so
    // this walks a short-lived fresh table rather than threading the
    // driver's through `resolve_position`'s signature. Cheap relative to a
    // search; paid once per `position` command.
    let tables = load_magic_tables();
    for move_str in &cmd.moves {
        let mv = parse_uci_move(&board, move_str, &tables)
            .ok_or_else(|| format!("invalid move: {}", move_str))?;
        vantage::moves::execute::make_move_basic(&mut board, mv);
    }

    Ok(board)
}

fn find_book_move(
    book: &Option<PolyglotBook>,
    driver: &EngineDriver,
    _go: &GoCommand,
) -> Option<String> {
    book.as_ref()
        .and_then(|b| b.probe(driver.board()))
        .map(|mv| mv.to_uci())
}

/// Resolve time control and hand the search to the driver's worker thread.
/// Returns the channel the main loop drains for `info` lines as they arrive.
fn spawn_search(go: &GoCommand, driver: &mut EngineDriver) -> mpsc::Receiver<String> {
    let side = driver.board().side_to_move;
    let (depth, time_limit) = uci::resolve_time_control(go, side);

    if let Some(limit) = time_limit {
        println!("info string target time: {}ms", limit.as_millis());
    }

    let (tx, rx) = mpsc::channel();
    driver.go(depth, time_limit, move |info| {
        let _ = tx.send(info.to_uci_line());
    });
    rx
}

fn report_bestmove(best_move: Option<Move>) {
    match best_move {
        Some(m) => println!("bestmove {}", m.to_uci()),
        None => println!("bestmove 0000"),
    }
}

fn parse_uci_move(board: &Board, move_str: &str, tables: &MagicTables) -> Option<Move> {
    if move_str.len() < 4 {
        return None;
    }

    let chars: Vec<char> = move_str.chars().collect();

    let from_file = (chars[0] as u8).wrapping_sub(b'a');
    let from_rank = (chars[1] as u8).wrapping_sub(b'1');
    let to_file = (chars[2] as u8).wrapping_sub(b'a');
    let to_rank = (chars[3] as u8).wrapping_sub(b'1');

    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    let from_square = (from_rank * 8 + from_file) as usize;
    let to_square = (to_rank * 8 + to_file) as usize;

    let promo_piece = if move_str.len() >= 5 {
        match chars[4] {
            'q' => Some(Piece::Queen),
            'r' => Some(Piece::Rook),
            'b' => Some(Piece::Bishop),
            'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    let mut board_copy = board.clone();
    generate_legal(&mut board_copy, tables, &mut moves, &mut scratch);

    for mv in moves {
        if (mv.from.index() as usize) == from_square && (mv.to.index() as usize) == to_square {
            if promo_piece.is_some() {
                if mv.promotion == promo_piece {
                    return Some(mv);
                }
            } else if mv.promotion.is_none() {
                return Some(mv);
            }
        }
    }
    None
}

// --- EPD Test Runner (ungated bench/test subcommand) ---
fn run_epd_tests(path: &str, driver: &EngineDriver) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => match File::open(format!("bench_arena/{}", path.split('/').last().unwrap())) {
            Ok(f) => f,
            Err(_) => {
                println!("Error: Could not find EPD file at '{}' or local.", path);
                return;
            }
        },
    };

    println!("Running Tactical Tests from {} (1s per position)...", path);
    println!("----------------------------------------------------");

    let reader = BufReader::new(file);
    let mut solved = 0;
    let mut total = 0;
    let tables = driver.tables();

    for (line_idx, line_res) in reader.lines().enumerate() {
        let line = line_res.unwrap_or_default();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(bm_idx) = line.find(" bm ") {
            let fen = &line[..bm_idx].trim();
            let rest = &line[bm_idx + 4..];
            let move_end = rest.find(';').unwrap_or(rest.len());
            let san_move = rest[..move_end].trim();

            let mut board = match Board::from_str(fen) {
                Ok(b) => b,
                Err(_) => {
                    println!("Error parsing FEN on line {}", line_idx + 1);
                    continue;
                }
            };

            let expected_uci = san_to_uci(&mut board, san_move, tables);

            let time_limit = Some(Duration::from_millis(1000));
            let depth = 64;

            let (_score, best_move) = search(&mut board, tables, depth, time_limit);

            let result_str = match best_move {
                Some(m) => m.to_uci(),
                None => "none".to_string(),
            };

            let passed = if let Some(ref exp) = expected_uci {
                *exp == result_str
            } else {
                false
            };

            if passed {
                solved += 1;
            }
            total += 1;

            println!("Test #{}: {}", total, if passed { "PASS" } else { "FAIL" });
            if !passed {
                println!(
                    "   Expected: {} | Got: {}",
                    expected_uci.unwrap_or(san_move.to_string()),
                    result_str
                );
            }
        }
    }

    println!("----------------------------------------------------");
    println!("Result: {}/{} Solved", solved, total);
    let _ = io::stdout().flush();
}

// --- Helper: Convert SAN to UCI ---
fn san_to_uci(board: &mut Board, san: &str, tables: &MagicTables) -> Option<String> {
    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    generate_legal(board, tables, &mut moves, &mut scratch);

    let clean_san = san.replace("+", "").replace("#", "").replace("x", "");

    if clean_san == "O-O" {
        return moves
            .iter()
            .find(|m| {
                let from = m.from.index() as i8;
                let to = m.to.index() as i8;
                (to - from).abs() == 2 && to > from
            })
            .map(|m| m.to_uci());
    }
    if clean_san == "O-O-O" {
        return moves
            .iter()
            .find(|m| {
                let from = m.from.index() as i8;
                let to = m.to.index() as i8;
                (to - from).abs() == 2 && to < from
            })
            .map(|m| m.to_uci());
    }

    if clean_san.len() < 2 {
        return None;
    }
    let target_str = &clean_san[clean_san.len() - 2..];

    let file = (target_str.chars().nth(0)? as u8).wrapping_sub(b'a');
    let rank = (target_str.chars().nth(1)? as u8).wrapping_sub(b'1');
    if file > 7 || rank > 7 {
        return None;
    }
    let target_sq = (rank * 8 + file) as usize;

    let first_char = clean_san.chars().next()?;
    let piece_type = match first_char {
        'N' => Piece::Knight,
        'B' => Piece::Bishop,
        'R' => Piece::Rook,
        'Q' => Piece::Queen,
        'K' => Piece::King,
        _ => Piece::Pawn,
    };

    let disambig_char = if piece_type == Piece::Pawn {
        if clean_san.len() > 2 && first_char.is_lowercase() {
            Some(first_char)
        } else {
            None
        }
    } else {
        let content = &clean_san[1..clean_san.len() - 2];
        if !content.is_empty() {
            content.chars().next()
        } else {
            None
        }
    };

    let candidates: Vec<&Move> = moves
        .iter()
        .filter(|m| {
            if (m.to.index() as usize) != target_sq {
                return false;
            }

            if let Some((_, p)) = board.piece_at(m.from) {
                if p != piece_type {
                    return false;
                }
            } else {
                return false;
            }

            if let Some(d) = disambig_char {
                let from_sq = m.from.index();
                let from_file = from_sq % 8;
                let from_rank = from_sq / 8;

                if d >= 'a' && d <= 'h' {
                    if from_file != (d as u8 - b'a') {
                        return false;
                    }
                } else if d >= '1' && d <= '8' {
                    if from_rank != (d as u8 - b'1') {
                        return false;
                    }
                }
            }
            true
        })
        .collect();

    if !candidates.is_empty() {
        Some(candidates[0].to_uci())
    } else {
        None
    }
}
