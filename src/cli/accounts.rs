use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::registry::list_accounts;
use crate::reports::sort_by_account_number;

pub fn list() -> Result<()> {
    let conn = super::open_db()?;
    let mut accounts = list_accounts(&conn)?;
    sort_by_account_number(&mut accounts, |a| a.account_number.as_str());

    let mut table = Table::new();
    table.set_header(vec!["ID", "Account", "Class"]);
    for acct in accounts {
        table.add_row(vec![
            Cell::new(acct.id),
            Cell::new(acct.account_number),
            Cell::new(acct.class_block.unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
