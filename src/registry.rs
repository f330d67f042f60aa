use rusqlite::{Connection, OptionalExtension};

use crate::error::{OborotError, Result};
use crate::models::{Account, NewAccount};

fn account_from_row(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        account_number: row.get(1)?,
        class_block: row.get(2)?,
    })
}

pub fn find_account(conn: &Connection, account_number: &str) -> Result<Option<Account>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, account_number, class_block FROM accounts WHERE account_number = ?1",
    )?;
    Ok(stmt.query_row([account_number], account_from_row).optional()?)
}

/// Look up an account by number, creating it if it does not exist yet.
pub fn ensure_account(conn: &Connection, account_number: &str) -> Result<Account> {
    if let Some(existing) = find_account(conn, account_number)? {
        return Ok(existing);
    }
    if !NewAccount::fits(account_number) {
        return Err(OborotError::AccountNumberTooLong(account_number.to_string()));
    }
    let new = NewAccount::new(account_number);
    conn.execute(
        "INSERT INTO accounts (account_number, class_block) VALUES (?1, ?2)",
        rusqlite::params![new.account_number, new.class_block],
    )?;
    tracing::debug!(account = %new.account_number, "Registered account");
    Ok(Account {
        id: conn.last_insert_rowid(),
        account_number: new.account_number,
        class_block: new.class_block,
    })
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT id, account_number, class_block FROM accounts ORDER BY id")?;
    let rows = stmt
        .query_map([], account_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
