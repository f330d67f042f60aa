use std::path::PathBuf;

use crate::error::{OborotError, Result};
use crate::importer::import_file;

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let conn = super::open_db()?;

    let result = match import_file(&conn, &file_path) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(file = %file_path.display(), error = %e, "Error processing file");
            return Err(OborotError::IngestFailed);
        }
    };

    println!("Uploaded file #{}", result.file_id);
    println!(
        "{} imported, {} summary rows skipped, {} unknown accounts, {} non-numeric rows",
        result.imported, result.sentinels, result.unknown, result.non_numeric
    );
    println!("{} accounts in first column\n", result.accounts);

    super::files::print_listing(&conn)
}
