use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::error::Result;
use crate::reports::list_files;

pub fn run() -> Result<()> {
    let conn = super::open_db()?;
    print_listing(&conn)
}

pub fn print_listing(conn: &Connection) -> Result<()> {
    let files = list_files(conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "File", "Uploaded (UTC)"]);
    for file in &files {
        table.add_row(vec![
            Cell::new(file.id),
            Cell::new(&file.file_name),
            Cell::new(&file.upload_date),
        ]);
    }
    println!("Uploaded files\n{table}");
    Ok(())
}
