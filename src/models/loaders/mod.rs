pub mod csv_loader;

pub use csv_loader::{load_records, parse_records};
