use std::path::Path;
use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::Amounts;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    account_number TEXT NOT NULL UNIQUE CHECK (length(account_number) <= 20),
    class_block TEXT CHECK (class_block IS NULL OR length(class_block) = 1)
);

CREATE TABLE IF NOT EXISTS uploaded_files (
    id INTEGER PRIMARY KEY,
    file_name TEXT NOT NULL,
    upload_date TEXT NOT NULL DEFAULT (datetime('now')),
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS account_records (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    file_id INTEGER NOT NULL,
    incoming_active TEXT NOT NULL,
    incoming_passive TEXT NOT NULL,
    debit_turnover TEXT NOT NULL,
    credit_turnover TEXT NOT NULL,
    outgoing_active TEXT NOT NULL,
    outgoing_passive TEXT NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (file_id) REFERENCES uploaded_files(id)
);

CREATE INDEX IF NOT EXISTS idx_account_records_file ON account_records(file_id);
";

/// Column list matching `amounts_at` and `amount_params`.
pub const AMOUNT_COLUMNS: &str = "incoming_active, incoming_passive, debit_turnover, \
                                  credit_turnover, outgoing_active, outgoing_passive";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Read a decimal stored as text.
pub fn decimal_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read the six amount columns starting at `first`.
pub fn amounts_at(row: &rusqlite::Row, first: usize) -> rusqlite::Result<Amounts> {
    Ok(Amounts {
        incoming_active: decimal_at(row, first)?,
        incoming_passive: decimal_at(row, first + 1)?,
        debit_turnover: decimal_at(row, first + 2)?,
        credit_turnover: decimal_at(row, first + 3)?,
        outgoing_active: decimal_at(row, first + 4)?,
        outgoing_passive: decimal_at(row, first + 5)?,
    })
}

/// Amounts as fixed two-place text, in `AMOUNT_COLUMNS` order.
pub fn amount_params(amounts: &Amounts) -> [String; 6] {
    amounts.to_array().map(|v| format!("{:.2}", v.round_dp(2)))
}
