use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, DB_FILE};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let records: i64 = conn.query_row("SELECT count(*) FROM account_records", [], |r| r.get(0))?;
        let files: i64 = conn.query_row("SELECT count(*) FROM uploaded_files", [], |r| r.get(0))?;

        println!();
        println!("Accounts:   {accounts}");
        println!("Records:    {records}");
        println!("Files:      {files}");
    } else {
        println!();
        println!("Database not found. Run `oborot init` to set up.");
    }

    Ok(())
}
