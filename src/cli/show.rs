use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::format_sum;
use crate::reports::file_detail;

pub fn run(file_id: i64) -> Result<()> {
    let conn = super::open_db()?;
    let detail = file_detail(&conn, file_id)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Account", "In. Active", "In. Passive", "Debit", "Credit", "Out. Active", "Out. Passive",
    ]);
    for record in &detail.records {
        let mut cells = vec![Cell::new(record.id), Cell::new(&record.account_number)];
        cells.extend(
            record
                .amounts
                .to_array()
                .map(|v| Cell::new(format_sum(v)).set_alignment(CellAlignment::Right)),
        );
        table.add_row(cells);
    }

    println!("{} (uploaded {})", detail.file.file_name, detail.file.upload_date);
    if let Some(checksum) = &detail.file.checksum {
        println!("SHA-256: {checksum}");
    }
    match &detail.account {
        Some(account) => println!("Account {}: {} records\n{table}", account.account_number, detail.records.len()),
        None => println!("No account matches the file name."),
    }
    Ok(())
}
