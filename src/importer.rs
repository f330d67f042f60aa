use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::{amount_params, AMOUNT_COLUMNS};
use crate::error::Result;
use crate::models::{Account, Amounts};
use crate::registry::{ensure_account, find_account};
use crate::sheet::{parse_sheet, SheetRow};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn record_upload(conn: &Connection, file_name: &str, checksum: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO uploaded_files (file_name, checksum) VALUES (?1, ?2)",
        rusqlite::params![file_name, checksum],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Register every numeric account number in the first column, in first-seen
/// order. Returns how many distinct numbers were seen.
pub fn register_accounts(conn: &Connection, rows: &[SheetRow]) -> Result<usize> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows.iter().filter(|r| r.has_numeric_account()) {
        let Some(number) = row.account_number() else { continue };
        if seen.contains(&number) {
            continue;
        }
        ensure_account(conn, &number)?;
        seen.push(number);
    }
    Ok(seen.len())
}

/// Store one row's amounts against an account. Returns the new record id.
pub fn insert_record(conn: &Connection, file_id: i64, account: &Account, amounts: &Amounts) -> Result<i64> {
    amounts.check_range()?;
    let p = amount_params(amounts);
    conn.execute(
        &format!(
            "INSERT INTO account_records (account_id, file_id, {AMOUNT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        rusqlite::params![account.id, file_id, p[0], p[1], p[2], p[3], p[4], p[5]],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------------------------------------------------------------------------
// Row classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// A subtotal or balance line already present in the source sheet.
    Sentinel(&'static str),
    UnknownAccount(String),
    NonNumeric,
    Valid(Account, Amounts),
}

pub fn classify_row(conn: &Connection, row: &SheetRow) -> Result<RowOutcome> {
    if let Some(marker) = row.sentinel() {
        return Ok(RowOutcome::Sentinel(marker));
    }
    let number = row.account_number().unwrap_or_default();
    let Some(account) = find_account(conn, &number)? else {
        return Ok(RowOutcome::UnknownAccount(number));
    };
    match row.amounts() {
        Some(amounts) => Ok(RowOutcome::Valid(account, amounts)),
        None => Ok(RowOutcome::NonNumeric),
    }
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ImportResult {
    pub file_id: i64,
    pub accounts: usize,
    pub imported: usize,
    pub sentinels: usize,
    pub unknown: usize,
    pub non_numeric: usize,
}

pub fn import_file(conn: &Connection, file_path: &Path) -> Result<ImportResult> {
    let data = std::fs::read(file_path)?;
    let file_name = file_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    import_bytes(conn, file_name, &data)
}

/// Ingest one uploaded balance sheet. Each insert commits on its own; a
/// failure part way leaves the rows written so far in place.
pub fn import_bytes(conn: &Connection, file_name: &str, data: &[u8]) -> Result<ImportResult> {
    let rows = parse_sheet(data, file_name)?;
    let file_id = record_upload(conn, file_name, &compute_checksum(data))?;

    let mut result = ImportResult {
        file_id,
        accounts: register_accounts(conn, &rows)?,
        ..Default::default()
    };

    for row in &rows {
        match classify_row(conn, row)? {
            RowOutcome::Sentinel(marker) => {
                tracing::warn!(line = row.line, value = marker, "Skipping summary row");
                result.sentinels += 1;
            }
            RowOutcome::UnknownAccount(number) => {
                tracing::error!(line = row.line, account = %number, "Account does not exist, row skipped");
                result.unknown += 1;
            }
            RowOutcome::NonNumeric => result.non_numeric += 1,
            RowOutcome::Valid(account, amounts) => {
                let record_id = insert_record(conn, file_id, &account, &amounts)?;
                tracing::debug!(line = row.line, account = %account.account_number, record_id, "Stored record");
                result.imported += 1;
            }
        }
    }

    tracing::info!(
        file_id,
        file = file_name,
        imported = result.imported,
        skipped = result.sentinels + result.unknown + result.non_numeric,
        "Processed uploaded file"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::error::OborotError;
    use crate::reports::file_records;
    use crate::sheet::HEADER_ROWS;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn balance_csv(rows: &[&str]) -> Vec<u8> {
        let mut content = String::from("ОБОРОТНАЯ ВЕДОМОСТЬ\n");
        for _ in 1..HEADER_ROWS {
            content.push_str("Б/сч,Входящие,,Обороты,,Исходящие,\n");
        }
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content.into_bytes()
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_import_registers_accounts_and_skips_sentinels() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&[
            "101,1,2,3,4,5,6",
            "102,1,2,3,4,5,6",
            "ПО КЛАССУ,2,4,6,8,10,12",
            "201,1,2,3,4,5,6",
        ]);
        let result = import_bytes(&conn, "jan.csv", &data).unwrap();
        assert_eq!(result.accounts, 3);
        assert_eq!(result.imported, 3);
        assert_eq!(result.sentinels, 1);
        assert_eq!(count(&conn, "accounts"), 3);
        assert_eq!(count(&conn, "account_records"), 3);
        let numbers: Vec<String> = file_records(&conn, result.file_id)
            .unwrap()
            .into_iter()
            .map(|r| r.account_number)
            .collect();
        assert_eq!(numbers, vec!["101", "102", "201"]);
    }

    #[test]
    fn test_balance_row_never_ingested() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,1,1,1,1", "БАЛАНС,9,9,9,9,9,9"]);
        let result = import_bytes(&conn, "jan.csv", &data).unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.sentinels, 1);
        assert!(find_account(&conn, "БАЛАНС").unwrap().is_none());
    }

    #[test]
    fn test_non_numeric_row_dropped() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,x,1,1,1", "102,1,1,1,1,1,1"]);
        let result = import_bytes(&conn, "jan.csv", &data).unwrap();
        assert_eq!(result.non_numeric, 1);
        assert_eq!(result.imported, 1);
        // The account is still registered from the first column.
        assert!(find_account(&conn, "101").unwrap().is_some());
        assert_eq!(count(&conn, "account_records"), 1);
    }

    #[test]
    fn test_unknown_account_dropped() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["Итого по разделу,1,1,1,1,1,1", ",5,5,5,5,5,5", "101,1,1,1,1,1,1"]);
        let result = import_bytes(&conn, "jan.csv", &data).unwrap();
        assert_eq!(result.unknown, 2);
        assert_eq!(result.imported, 1);
        assert_eq!(count(&conn, "accounts"), 1);
    }

    #[test]
    fn test_blank_amount_stored_as_zero() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,\"1 500,25\",,3,4,5,6"]);
        let result = import_bytes(&conn, "jan.csv", &data).unwrap();
        let records = file_records(&conn, result.file_id).unwrap();
        assert_eq!(records[0].amounts.incoming_active, dec!(1500.25));
        assert_eq!(records[0].amounts.incoming_passive, Decimal::ZERO);
        let stored: String = conn
            .query_row("SELECT incoming_passive FROM account_records", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, "0.00");
    }

    #[test]
    fn test_classify_row_outcomes() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,1,1,1,1", "999,1,1,1,1,1,1"]);
        let rows = parse_sheet(&data, "jan.csv").unwrap();
        ensure_account(&conn, "101").unwrap();
        assert!(matches!(classify_row(&conn, &rows[0]).unwrap(), RowOutcome::Valid(..)));
        assert_eq!(
            classify_row(&conn, &rows[1]).unwrap(),
            RowOutcome::UnknownAccount("999".to_string())
        );
    }

    #[test]
    fn test_existing_accounts_reused_across_uploads() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,1,1,1,1"]);
        let first = import_bytes(&conn, "jan.csv", &data).unwrap();
        let second = import_bytes(&conn, "jan.csv", &data).unwrap();
        assert_ne!(first.file_id, second.file_id);
        assert_eq!(count(&conn, "accounts"), 1);
        assert_eq!(count(&conn, "uploaded_files"), 2);
        assert_eq!(count(&conn, "account_records"), 2);
    }

    #[test]
    fn test_upload_records_checksum() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,1,1,1,1"]);
        import_bytes(&conn, "jan.csv", &data).unwrap();
        let (name, checksum): (String, String) = conn
            .query_row("SELECT file_name, checksum FROM uploaded_files", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(name, "jan.csv");
        assert_eq!(checksum, compute_checksum(&data));
        assert_eq!(checksum.len(), 64);
    }

    #[test]
    fn test_oversized_amount_aborts_without_rollback() {
        let (_dir, conn) = test_db();
        let data = balance_csv(&["101,1,1,1,1,1,1", "102,1000000000000000000,0,0,0,0,0"]);
        let result = import_bytes(&conn, "jan.csv", &data);
        assert!(matches!(result, Err(OborotError::AmountOutOfRange(_))));
        assert_eq!(count(&conn, "account_records"), 1);
        assert_eq!(count(&conn, "uploaded_files"), 1);
    }

    #[test]
    fn test_import_file_reads_from_disk() {
        let (dir, conn) = test_db();
        let path = dir.path().join("feb.csv");
        std::fs::write(&path, balance_csv(&["20,1,1,1,1,1,1"])).unwrap();
        let result = import_file(&conn, &path).unwrap();
        assert_eq!(result.imported, 1);
        let name: String = conn
            .query_row("SELECT file_name FROM uploaded_files", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "feb.csv");
    }

    #[test]
    fn test_insert_record_returns_row_id() {
        let (_dir, conn) = test_db();
        let file_id = record_upload(&conn, "jan.csv", "abc").unwrap();
        let account = ensure_account(&conn, "101").unwrap();
        let amounts = Amounts {
            debit_turnover: dec!(12.5),
            ..Default::default()
        };
        let first = insert_record(&conn, file_id, &account, &amounts).unwrap();
        let second = insert_record(&conn, file_id, &account, &amounts).unwrap();
        assert_ne!(first, second);
        let ids: Vec<i64> = file_records(&conn, file_id).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    fn balance_workbook() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "ОБОРОТНАЯ ВЕДОМОСТЬ").unwrap();
        sheet.write_number(9, 0, 10101.0).unwrap();
        sheet.write_number(9, 1, 0.125).unwrap();
        sheet.write_string(9, 6, "2 500,00").unwrap();
        sheet.write_string(10, 0, "ПО КЛАССУ").unwrap();
        sheet.write_number(10, 1, 0.12).unwrap();
        sheet.write_number(11, 0, 20.0).unwrap();
        sheet.write_number(11, 2, 1.0).unwrap();
        sheet.write_string(12, 0, "БАЛАНС").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_import_xlsx_workbook() {
        let (_dir, conn) = test_db();
        let result = import_bytes(&conn, "jan.xlsx", &balance_workbook()).unwrap();
        assert_eq!(result.accounts, 2);
        assert_eq!(result.imported, 2);
        assert_eq!(result.sentinels, 2);
        assert_eq!(result.unknown, 0);

        let records = file_records(&conn, result.file_id).unwrap();
        assert_eq!(records[0].account_number, "10101");
        assert_eq!(records[0].class_block.as_deref(), Some("1"));
        assert_eq!(records[0].amounts.incoming_active, dec!(0.12));
        assert_eq!(records[0].amounts.outgoing_passive, dec!(2500));
        assert_eq!(records[1].account_number, "20");
        assert_eq!(records[1].amounts.incoming_passive, dec!(1));

        let stored: String = conn
            .query_row("SELECT outgoing_passive FROM account_records WHERE id = ?1", [records[0].id], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, "2500.00");
    }

    #[test]
    fn test_unreadable_workbook_fails() {
        let (_dir, conn) = test_db();
        let result = import_bytes(&conn, "jan.xlsx", b"not a spreadsheet");
        assert!(result.is_err());
        assert_eq!(count(&conn, "uploaded_files"), 0);
    }
}
