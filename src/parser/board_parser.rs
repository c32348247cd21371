use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use log::debug;

use crate::board::grid::{Cell, Grid};
use crate::types::error::{ArchitectureError, Result};
use crate::types::location::Location;

/// One token of the board text.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Empty,
    Auto,
    Heater(Option<u32>),
    Pin(u32),
}

/// Loader for textual board descriptions.
///
/// A board file is newline-separated rows of whitespace-separated tokens:
///
/// ```text
/// 0 1 2 3
/// a a H _
/// 8 a a
/// ```
///
/// An integer labels a cell with that pin id; `a` auto-assigns the next
/// free id; `H` (or `H<id>`) marks a heater cell; `_` or a short row leaves
/// a gap. Final pin ids must be exactly `{0..N-1}`.
#[derive(Debug, Clone, Default)]
pub struct BoardParser;

impl BoardParser {
    pub fn new() -> Self {
        BoardParser
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Grid> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    pub fn parse_str(&self, content: &str) -> Result<Grid> {
        let mut tokens: Vec<(Location, Token)> = Vec::new();
        for (row, line) in content.lines().enumerate() {
            for (col, word) in line.split_whitespace().enumerate() {
                let token = parse_token(word).ok_or_else(|| ArchitectureError::BadToken {
                    token: word.to_string(),
                    row,
                    col,
                })?;
                tokens.push((Location::new(row as i32, col as i32), token));
            }
        }

        // labeled ids first, so autos can fill the gaps densely
        let mut taken: HashSet<u32> = HashSet::new();
        let mut n_cells = 0;
        for (_, token) in &tokens {
            let labeled = match token {
                Token::Empty => continue,
                Token::Pin(pin) | Token::Heater(Some(pin)) => Some(*pin),
                Token::Auto | Token::Heater(None) => None,
            };
            n_cells += 1;
            if let Some(pin) = labeled {
                if !taken.insert(pin) {
                    return Err(ArchitectureError::DuplicatePin(pin).into());
                }
            }
        }
        if n_cells == 0 {
            return Err(ArchitectureError::EmptyBoard.into());
        }

        let mut free = (0u32..).filter(|pin| !taken.contains(pin));
        let mut cells: HashMap<Location, Cell> = HashMap::new();
        for (loc, token) in tokens {
            let cell = match token {
                Token::Empty => continue,
                Token::Pin(pin) => Cell::new(pin),
                Token::Heater(Some(pin)) => Cell::heater(pin),
                Token::Auto => Cell::new(free.next().expect("u32 range is endless")),
                Token::Heater(None) => Cell::heater(free.next().expect("u32 range is endless")),
            };
            cells.insert(loc, cell);
        }

        // ids must be dense: exactly {0..N-1}
        let ids: HashSet<u32> = cells.values().map(|cell| cell.pin).collect();
        for missing in 0..n_cells as u32 {
            if !ids.contains(&missing) {
                return Err(ArchitectureError::SparsePins {
                    expected: n_cells,
                    missing,
                }
                .into());
            }
        }

        let grid = Grid::new(cells);
        debug!("parsed board with {} cells", grid.len());
        Ok(grid)
    }
}

fn parse_token(word: &str) -> Option<Token> {
    match word {
        "_" => Some(Token::Empty),
        "a" => Some(Token::Auto),
        "H" => Some(Token::Heater(None)),
        _ => {
            if let Some(rest) = word.strip_prefix('H') {
                rest.parse().ok().map(|pin| Token::Heater(Some(pin)))
            } else {
                word.parse().ok().map(Token::Pin)
            }
        }
    }
}

/// Render a grid back to the textual format. Labeled round trip:
/// `parse_str(spec_string(g))` reconstructs `g` exactly.
pub fn spec_string(grid: &Grid) -> String {
    let bounds = match grid.bounds() {
        Some(bounds) => bounds,
        None => return String::new(),
    };

    // column widths per x, so rows line up
    let by_loc: BTreeMap<Location, String> = grid
        .iter()
        .map(|(loc, cell)| {
            let word = if cell.heater {
                format!("H{}", cell.pin)
            } else {
                cell.pin.to_string()
            };
            (loc, word)
        })
        .collect();

    let mut out = String::new();
    for y in bounds.min_y..=bounds.max_y {
        let mut row: Vec<String> = Vec::new();
        for x in bounds.min_x..=bounds.max_x {
            match by_loc.get(&Location::new(y, x)) {
                Some(word) => row.push(word.clone()),
                None => row.push("_".to_string()),
            }
        }
        // drop trailing gap markers
        while row.last().map(|w| w == "_").unwrap_or(false) {
            row.pop();
        }
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}
