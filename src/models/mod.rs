pub mod batch;
pub mod ledger;
pub mod loaders;
pub mod record;

pub use batch::{BatchPlan, OutputItem};
pub use ledger::{Ledger, LedgerEntry};
pub use loaders::{load_records, parse_records};
pub use record::Record;
