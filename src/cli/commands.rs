use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::board::board::{Board, StepBarrier};
use crate::cli::programs;
use crate::parser::board_parser::{BoardParser, spec_string};
use crate::runtime::session::Session;

#[derive(Parser)]
#[command(name = "fluidic")]
#[command(about = "A droplet microfluidics runtime for programmable electrode grids")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Board description file to validate
    pub board: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the board after every physical step
    #[arg(long)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a board description and report its stats
    Validate {
        /// Board description file
        board: String,
    },
    /// Run a built-in demo program on a board
    Run {
        /// Board description file
        board: String,
        /// Which demo program to run
        #[arg(long, value_enum, default_value = "simple-mix")]
        program: Program,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Program {
    SimpleMix,
    Chain,
    Lanes,
    Dilution,
}

/// Step barrier that dumps the board between physical steps; backs the
/// `--trace` flag.
pub struct TraceBarrier;

impl StepBarrier for TraceBarrier {
    fn step_boundary(&self, board: &Board) {
        for command in board.active_commands() {
            eprintln!("[{}]", command.name);
        }
        eprintln!("{}", board);
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Validate { ref board }) => self.validate_board(board),
            Some(Commands::Run { ref board, program }) => self.run_program(board, program),
            None => {
                if let Some(ref board) = self.board {
                    self.validate_board(board)
                } else {
                    println!("No board specified. Use --help for usage information.");
                    Ok(())
                }
            }
        }
    }

    fn validate_board(&self, path: &str) -> Result<()> {
        let grid = BoardParser::new().parse_file(path)?;

        println!("✓ Board parsed: {}", path);
        if let Some(bounds) = grid.bounds() {
            println!("  Dimensions: {}x{}", bounds.height(), bounds.width());
        }
        println!("  Cells: {}", grid.len());
        println!("  Connected: {}", grid.is_connected());
        if self.verbose {
            print!("{}", spec_string(&grid));
        }
        Ok(())
    }

    fn run_program(&self, path: &str, program: Program) -> Result<()> {
        let grid = BoardParser::new().parse_file(path)?;
        let mut session = Session::new(grid);
        if self.trace {
            session.set_barrier(Box::new(TraceBarrier));
        }

        let report = match program {
            Program::SimpleMix => programs::simple_mix(&mut session)?,
            Program::Chain => programs::chain(&mut session)?,
            Program::Lanes => programs::lanes(&mut session)?,
            Program::Dilution => programs::dilution(&mut session, 0.25, 0.1)?,
        };
        for line in report {
            println!("{}", line);
        }
        if self.verbose {
            eprint!("{}", session.board());
        }
        Ok(())
    }
}
