use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::reports::{self, ReportPayload, ReportRow, RowKind};

const AMOUNT_HEADERS: [&str; 6] = [
    "Incoming Active",
    "Incoming Passive",
    "Debit Turnover",
    "Credit Turnover",
    "Outgoing Active",
    "Outgoing Passive",
];

pub fn run(file_id: i64, json: bool) -> Result<()> {
    let conn = super::open_db()?;
    let file = reports::get_file(&conn, file_id)?;
    let rows = reports::build_report(&conn, file_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ReportPayload { data: &rows })?);
        return Ok(());
    }

    println!("{} ({})\n{}", file.file_name, file.upload_date, format_table(&rows));
    Ok(())
}

fn format_table(rows: &[ReportRow]) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Account", "Class"];
    header.extend(AMOUNT_HEADERS);
    table.set_header(header);

    for row in rows {
        let label = match row.kind {
            RowKind::Header => Cell::new(row.account_number.as_str().cyan().bold()),
            RowKind::Summary => Cell::new(row.account_number.as_str().bold()),
            RowKind::Data => Cell::new(&row.account_number),
        };
        let mut cells = vec![label, Cell::new(row.class_block.as_deref().unwrap_or(""))];
        cells.extend(
            row.amount_cells()
                .into_iter()
                .map(|v| Cell::new(v).set_alignment(CellAlignment::Right)),
        );
        table.add_row(cells);
    }
    table
}
