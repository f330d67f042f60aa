use rust_decimal::Decimal;

use crate::error::{OborotError, Result};

/// Width of the `account_number` column.
pub const ACCOUNT_NUMBER_MAX: usize = 20;

/// Largest integer part a stored amount may carry (20 digits, 2 of them decimal).
const AMOUNT_LIMIT: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub class_block: Option<String>,
}

/// An account that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub account_number: String,
    pub class_block: Option<String>,
}

impl NewAccount {
    pub fn new(account_number: &str) -> Self {
        Self {
            account_number: account_number.to_string(),
            class_block: None,
        }
        .with_derived_class_block()
    }

    pub fn fits(account_number: &str) -> bool {
        account_number.chars().count() <= ACCOUNT_NUMBER_MAX
    }

    /// Fill in the class block from the leading character of the account
    /// number. An already-set class block is kept as is.
    pub fn with_derived_class_block(mut self) -> Self {
        if self.class_block.is_none() {
            self.class_block = self.account_number.chars().next().map(String::from);
        }
        self
    }
}

/// The six amount columns of a turnover balance sheet row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Amounts {
    pub incoming_active: Decimal,
    pub incoming_passive: Decimal,
    pub debit_turnover: Decimal,
    pub credit_turnover: Decimal,
    pub outgoing_active: Decimal,
    pub outgoing_passive: Decimal,
}

impl Amounts {
    pub fn from_array(values: [Decimal; 6]) -> Self {
        let [incoming_active, incoming_passive, debit_turnover, credit_turnover, outgoing_active, outgoing_passive] =
            values;
        Self {
            incoming_active,
            incoming_passive,
            debit_turnover,
            credit_turnover,
            outgoing_active,
            outgoing_passive,
        }
    }

    pub fn to_array(&self) -> [Decimal; 6] {
        [
            self.incoming_active,
            self.incoming_passive,
            self.debit_turnover,
            self.credit_turnover,
            self.outgoing_active,
            self.outgoing_passive,
        ]
    }

    /// Reject values that would not fit a 20-digit, 2-place decimal column.
    pub fn check_range(&self) -> Result<()> {
        let limit = Decimal::from(AMOUNT_LIMIT);
        for value in self.to_array() {
            if value.abs() >= limit {
                return Err(OborotError::AmountOutOfRange(value.to_string()));
            }
        }
        Ok(())
    }
}

impl std::ops::AddAssign<&Amounts> for Amounts {
    fn add_assign(&mut self, other: &Amounts) {
        self.incoming_active += other.incoming_active;
        self.incoming_passive += other.incoming_passive;
        self.debit_turnover += other.debit_turnover;
        self.credit_turnover += other.credit_turnover;
        self.outgoing_active += other.outgoing_active;
        self.outgoing_passive += other.outgoing_passive;
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: i64,
    pub file_name: String,
    pub upload_date: String,
    pub checksum: Option<String>,
}

/// A stored record joined with its account, as read back for display.
#[derive(Debug, Clone)]
pub struct RecordView {
    pub id: i64,
    pub account_number: String,
    pub class_block: Option<String>,
    pub amounts: Amounts,
}
