use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use calamine::{Data, Reader};
use rust_decimal::Decimal;

use crate::error::{OborotError, Result};
use crate::models::Amounts;
use crate::reports::{SUBTOTAL_LABEL, TOTAL_LABEL};

/// Title block rows above the data in an exported balance sheet.
pub const HEADER_ROWS: usize = 9;

/// Precomputed subtotal rows that must not be ingested again.
pub const SENTINELS: [&str; 2] = [SUBTOTAL_LABEL, TOTAL_LABEL];

/// Columns 2 through 7 carry the six amounts.
const AMOUNT_CELLS: std::ops::Range<usize> = 1..7;

static EMPTY: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(Decimal),
    Text(String),
}

impl Cell {
    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match parse_number(trimmed) {
            Some(n) => Cell::Number(n),
            None => Cell::Text(trimmed.to_string()),
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(Decimal::from(*i)),
            Data::Float(f) => match Decimal::from_f64_retain(*f) {
                Some(d) => Cell::Number(d.round_dp(2)),
                None => Cell::Text(f.to_string()),
            },
            Data::String(s) => Cell::from_text(s),
            other => Cell::Text(other.to_string()),
        }
    }

    /// The cell as a string key: numbers without trailing zeros, text trimmed.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(n.normalize().to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// Parse a number written with spaces between thousands and a comma before
/// the decimals, e.g. "1 234 567,89". Plain "1234.5" is accepted too.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().map(|d| d.round_dp(2))
}

/// One data row below the header block.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number in the source sheet.
    pub line: usize,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    fn first(&self) -> &Cell {
        self.cells.first().unwrap_or(&EMPTY)
    }

    pub fn account_number(&self) -> Option<String> {
        self.first().as_key()
    }

    pub fn has_numeric_account(&self) -> bool {
        matches!(self.first(), Cell::Number(_))
    }

    pub fn sentinel(&self) -> Option<&'static str> {
        let key = self.account_number()?;
        SENTINELS.into_iter().find(|s| *s == key)
    }

    /// The six amount cells, with blanks as zero. `None` if any is text.
    pub fn amounts(&self) -> Option<Amounts> {
        let mut values = [Decimal::ZERO; 6];
        for (slot, idx) in values.iter_mut().zip(AMOUNT_CELLS) {
            match self.cells.get(idx).unwrap_or(&EMPTY) {
                Cell::Empty => {}
                Cell::Number(n) => *slot = *n,
                Cell::Text(_) => return None,
            }
        }
        Some(Amounts::from_array(values))
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| *c == Cell::Empty)
    }
}

/// Parse an uploaded balance sheet. CSV is chosen by extension, anything else
/// is handed to calamine. Header rows and blank rows are dropped.
pub fn parse_sheet(raw: &[u8], file_name: &str) -> Result<Vec<SheetRow>> {
    let grid = if is_csv(file_name) {
        read_csv(raw)?
    } else {
        read_workbook(raw)?
    };

    let rows = grid
        .into_iter()
        .enumerate()
        .skip(HEADER_ROWS)
        .map(|(i, cells)| SheetRow { line: i + 1, cells })
        .filter(|row| !row.is_blank())
        .collect();
    Ok(rows)
}

fn is_csv(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

/// CSV exports come as UTF-8 or, from older banking software, Windows-1251.
fn decode_csv(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(raw);
            decoded
        }
    }
}

fn read_csv(raw: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let text = decode_csv(raw);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(grid)
}

fn read_workbook(raw: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(raw.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| OborotError::Other("Workbook has no worksheets".to_string()))??;

    // calamine ranges start at the first used cell; pad back to A1 so the
    // header offset counts from the top of the sheet.
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(Cell::from_data));
        grid.push(cells);
    }
    Ok(grid)
}
