use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use panel_optimizer::ScoreStrategy;
use panel_optimizer::solver::{Config, Solver};
use panel_optimizer::types::{CutOrientation, MultiBoardResult, Piece, Rect};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_optimizer",
    about = "Guillotine cutting plans for rectangular panels"
)]
struct Cli {
    /// Board dimensions after trimming (WxH, e.g. 2770x2040)
    #[arg(long)]
    board: String,

    /// Pieces as WxH:qty, append :fixed to forbid rotation (e.g. 800x600:3 400x300:5:fixed)
    #[arg(long = "pieces", num_args = 1..)]
    pieces: Vec<String>,

    /// JSON file holding an array of pieces, read in addition to --pieces
    #[arg(long)]
    input: Option<PathBuf>,

    /// Blade kerf width in mm (default: 0)
    #[arg(long, default_value_t = 0)]
    kerf: u32,

    /// Placement heuristic
    #[arg(long, value_enum, default_value_t = StrategyArg::Area)]
    strategy: StrategyArg,

    /// List the saw passes of each board
    #[arg(long)]
    cuts: bool,

    /// Print the whole result as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log progress to stderr
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Best area fit
    Area,
    /// Best short side fit
    ShortSide,
    /// Best long side fit
    LongSide,
    /// Try all and keep the plan with the fewest boards
    Best,
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let w = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok(Rect::new(w, h))
}

fn parse_piece(idx: usize, s: &str) -> Result<Piece, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let (dims, qty, allow_rotate) = match parts.as_slice() {
        [dims, qty] => (*dims, *qty, true),
        [dims, qty, "fixed"] => (*dims, *qty, false),
        _ => return Err(format!("invalid piece '{}', expected WxH:qty[:fixed]", s)),
    };
    let rect = parse_dimensions(dims)?;
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(Piece::new(format!("p{}", idx + 1), rect, qty, allow_rotate))
}

fn read_pieces(path: &PathBuf) -> Result<Vec<Piece>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid pieces in {}: {}", path.display(), e))
}

fn load_pieces(cli: &Cli) -> Result<Vec<Piece>, String> {
    let mut pieces = match &cli.input {
        Some(path) => read_pieces(path)?,
        None => Vec::new(),
    };
    let offset = pieces.len();
    for (i, s) in cli.pieces.iter().enumerate() {
        pieces.push(parse_piece(offset + i, s)?);
    }
    Ok(pieces)
}

fn print_text(result: &MultiBoardResult, show_cuts: bool) {
    for layout in &result.boards {
        println!(
            "Board {} ({:.1}% used):",
            layout.board_number,
            layout.efficiency * 100.0
        );
        for p in &layout.placed_pieces {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {:<8} {} @ ({}, {}){}", p.piece_id, p.rect, p.x, p.y, rot);
        }
        if show_cuts {
            println!("  cuts:");
            for (i, c) in layout.cut_lines.iter().enumerate() {
                let (axis, span) = match c.orientation {
                    CutOrientation::Horizontal => ("y", "x"),
                    CutOrientation::Vertical => ("x", "y"),
                };
                println!(
                    "    {:>3}. {}={} {} {}..{}",
                    i + 1,
                    axis,
                    c.position,
                    span,
                    c.start,
                    c.end
                );
            }
        }
        println!();
    }

    println!(
        "Summary: {} board{} used, {}/{} pieces placed, {:.1}% waste",
        result.total_boards,
        if result.total_boards == 1 { "" } else { "s" },
        result.total_placed_pieces,
        result.total_pieces,
        result.waste_percent(),
    );
    if let Some(warning) = result.warning() {
        println!("Warning: {}", warning);
        for u in &result.unplaced_pieces {
            println!("  {} x{}", u.piece_id, u.qty);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .init();
    }

    let board = parse_dimensions(&cli.board).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let pieces = load_pieces(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let strategy = match cli.strategy {
        StrategyArg::Area | StrategyArg::Best => ScoreStrategy::BestAreaFit,
        StrategyArg::ShortSide => ScoreStrategy::BestShortSideFit,
        StrategyArg::LongSide => ScoreStrategy::BestLongSideFit,
    };
    let solver = Solver::new(
        board,
        Config {
            kerf: cli.kerf,
            strategy,
        },
        pieces,
    );
    let result = if cli.strategy == StrategyArg::Best {
        solver.solve_best()
    } else {
        solver.solve()
    };
    let result = result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_text(&result, cli.cuts);
    }
}
