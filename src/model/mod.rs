//! Types that represent the core data model, such as `ExpenseRecord` and `ExpenseTable`.
mod amount;
mod month;
pub(crate) mod record;
mod table;

pub use amount::{Amount, AmountError};
pub use month::{parse_month, YearMonth};
pub use record::{
    parse_timestamp, ExpenseRecord, CATEGORY, COMMENTS, INSERT_DATE, TIMESTAMP_FORMAT, VALUE,
};
pub(crate) use table::fingerprint;
pub use table::{ExpenseTable, MalformedPolicy, MalformedRow};
