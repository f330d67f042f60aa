use std::cmp::Ordering;
use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::aggregator::ClassTotals;
use crate::db::{amounts_at, AMOUNT_COLUMNS};
use crate::error::{OborotError, Result};
use crate::fmt::format_sum;
use crate::models::{Account, Amounts, NewAccount, RecordView, UploadedFile};
use crate::registry::ensure_account;

pub const CLASS_LABEL: &str = "КЛАСС";
pub const SUBTOTAL_LABEL: &str = "ПО КЛАССУ";
pub const TOTAL_LABEL: &str = "БАЛАНС";
pub const TOTAL_CLASS_BLOCK: &str = "ВСЕ";

/// Chart-of-accounts section names for each classification code.
pub fn class_description(code: &str) -> &'static str {
    match code {
        "1" => "Денежные средства, драгоценные металлы и межбанковские операции",
        "2" => "Кредитные и иные активные операции с клиентами",
        "3" => "Счета по операциям клиентов",
        "4" => "Ценные бумаги",
        "5" => "Долгосрочные финансовые вложения в уставные фонды юридических лиц, \
                основные средства и прочее имущество",
        "6" => "Прочие активы и прочие пассивы",
        "7" => "Собственный капитал банка",
        "8" => "Доходы банка",
        "9" => "Расходы банка",
        _ => "",
    }
}

/// A class-level account number is exactly two characters long.
pub fn is_class_level(account_number: &str) -> bool {
    account_number.chars().count() == 2
}

// ---------------------------------------------------------------------------
// Uploaded files
// ---------------------------------------------------------------------------

fn file_from_row(row: &rusqlite::Row) -> rusqlite::Result<UploadedFile> {
    Ok(UploadedFile {
        id: row.get(0)?,
        file_name: row.get(1)?,
        upload_date: row.get(2)?,
        checksum: row.get(3)?,
    })
}

pub fn get_file(conn: &Connection, file_id: i64) -> Result<UploadedFile> {
    conn.query_row(
        "SELECT id, file_name, upload_date, checksum FROM uploaded_files WHERE id = ?1",
        [file_id],
        file_from_row,
    )
    .optional()?
    .ok_or(OborotError::FileNotFound(file_id))
}

pub fn list_files(conn: &Connection) -> Result<Vec<UploadedFile>> {
    let mut stmt = conn.prepare("SELECT id, file_name, upload_date, checksum FROM uploaded_files ORDER BY id")?;
    let rows = stmt
        .query_map([], file_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

fn query_records(conn: &Connection, filter: &str, id: i64) -> Result<Vec<RecordView>> {
    let sql = format!(
        "SELECT r.id, a.account_number, a.class_block, {AMOUNT_COLUMNS} \
         FROM account_records r JOIN accounts a ON r.account_id = a.id \
         WHERE {filter} = ?1 ORDER BY r.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([id], |row| {
            Ok(RecordView {
                id: row.get(0)?,
                account_number: row.get(1)?,
                class_block: row.get(2)?,
                amounts: amounts_at(row, 3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Records ingested from one file, in insertion order.
pub fn file_records(conn: &Connection, file_id: i64) -> Result<Vec<RecordView>> {
    query_records(conn, "r.file_id", file_id)
}

pub fn account_records(conn: &Connection, account_id: i64) -> Result<Vec<RecordView>> {
    query_records(conn, "r.account_id", account_id)
}

// ---------------------------------------------------------------------------
// Class-grouped report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Header,
    Data,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub account_number: String,
    pub class_block: Option<String>,
    pub is_header: bool,
    pub kind: RowKind,
    pub incoming_active: Option<String>,
    pub incoming_passive: Option<String>,
    pub debit_turnover: Option<String>,
    pub credit_turnover: Option<String>,
    pub outgoing_active: Option<String>,
    pub outgoing_passive: Option<String>,
}

impl ReportRow {
    fn new(account_number: String, class_block: Option<String>, kind: RowKind, amounts: Option<&Amounts>) -> Self {
        let [ia, ip, dt, ct, oa, op] = match amounts {
            Some(a) => a.to_array().map(|v| Some(format_sum(v))),
            None => Default::default(),
        };
        Self {
            account_number,
            class_block,
            is_header: kind != RowKind::Data,
            kind,
            incoming_active: ia,
            incoming_passive: ip,
            debit_turnover: dt,
            credit_turnover: ct,
            outgoing_active: oa,
            outgoing_passive: op,
        }
    }

    fn header(code: &str) -> Self {
        let label = format!("{CLASS_LABEL} {code} {}", class_description(code));
        Self::new(label, None, RowKind::Header, None)
    }

    fn data(record: &RecordView) -> Self {
        Self::new(
            record.account_number.clone(),
            record.class_block.clone(),
            RowKind::Data,
            Some(&record.amounts),
        )
    }

    fn subtotal(code: &str, sums: &Amounts) -> Self {
        Self::new(SUBTOTAL_LABEL.to_string(), Some(code.to_string()), RowKind::Summary, Some(sums))
    }

    fn total(sums: &Amounts) -> Self {
        Self::new(
            TOTAL_LABEL.to_string(),
            Some(TOTAL_CLASS_BLOCK.to_string()),
            RowKind::Summary,
            Some(sums),
        )
    }

    /// The amount cells in column order, blank for header rows.
    pub fn amount_cells(&self) -> [&str; 6] {
        [
            &self.incoming_active,
            &self.incoming_passive,
            &self.debit_turnover,
            &self.credit_turnover,
            &self.outgoing_active,
            &self.outgoing_passive,
        ]
        .map(|v| v.as_deref().unwrap_or(""))
    }
}

/// JSON body of the report: `{"data": [...]}`.
#[derive(Debug, Serialize)]
pub struct ReportPayload<'a> {
    pub data: &'a [ReportRow],
}

pub fn build_report(conn: &Connection, file_id: i64) -> Result<Vec<ReportRow>> {
    get_file(conn, file_id)?;
    let records = file_records(conn, file_id)?;
    Ok(assemble_report(&records))
}

/// Interleave class headers and subtotals with the data rows and close with
/// the grand total.
///
/// A class gets a subtotal only when one of its rows is a class-level
/// (two-character) account. Those rows are summed twice into the running
/// totals, matching the figures the source reports have always shown.
pub fn assemble_report(records: &[RecordView]) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    let mut totals = ClassTotals::new();
    let mut with_class_level: HashSet<String> = HashSet::new();
    let mut current: Option<String> = None;

    for record in records {
        let code = record.class_block.clone().unwrap_or_default();
        totals.accumulate(&code, &record.amounts);

        if current.as_deref() != Some(code.as_str()) {
            if let Some(prev) = current.as_deref() {
                if with_class_level.contains(prev) {
                    rows.push(ReportRow::subtotal(prev, &totals.get(prev)));
                }
            }
            rows.push(ReportRow::header(&code));
            current = Some(code.clone());
        }

        if is_class_level(&record.account_number) {
            totals.accumulate(&code, &record.amounts);
            with_class_level.insert(code);
        }

        rows.push(ReportRow::data(record));
    }

    if let Some(last) = current.as_deref() {
        if with_class_level.contains(last) {
            rows.push(ReportRow::subtotal(last, &totals.get(last)));
        }
    }

    rows.push(ReportRow::total(&totals.grand_total()));
    rows
}

// ---------------------------------------------------------------------------
// Account ordering
// ---------------------------------------------------------------------------

fn order_key(account_number: &str) -> (u64, u64, &str) {
    let split = account_number
        .char_indices()
        .nth(2)
        .map_or(account_number.len(), |(i, _)| i);
    let (prefix, rest) = account_number.split_at(split);
    let prefix = prefix.parse().unwrap_or(u64::MAX);
    let rest = if rest.is_empty() {
        u64::MAX
    } else {
        rest.parse().unwrap_or(u64::MAX)
    };
    (prefix, rest, account_number)
}

/// Order account numbers by their two-digit class, then by the sub-account
/// digits. A bare class-level number sorts after its sub-accounts.
pub fn account_order(a: &str, b: &str) -> Ordering {
    order_key(a).cmp(&order_key(b))
}

pub fn sort_by_account_number<T>(items: &mut [T], key: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| account_order(key(a), key(b)));
}

// ---------------------------------------------------------------------------
// File detail
// ---------------------------------------------------------------------------

pub struct FileDetail {
    pub file: UploadedFile,
    /// `None` when the file name is too long to be an account number.
    pub account: Option<Account>,
    pub records: Vec<RecordView>,
}

/// Raw records shown for an uploaded file.
///
/// Records are resolved through the account whose number equals the file
/// name, which registers that account if it is missing. This is how the
/// detail page has always behaved; `file_records` gives the per-file view.
/// A file name wider than an account number matches nothing.
pub fn file_detail(conn: &Connection, file_id: i64) -> Result<FileDetail> {
    let file = get_file(conn, file_id)?;
    if !NewAccount::fits(&file.file_name) {
        return Ok(FileDetail {
            file,
            account: None,
            records: Vec::new(),
        });
    }
    let account = ensure_account(conn, &file.file_name)?;
    let records = account_records(conn, account.id)?;
    Ok(FileDetail {
        file,
        account: Some(account),
        records,
    })
}
