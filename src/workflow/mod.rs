pub mod batch_planner;

pub use batch_planner::{batch_dir_name, diff_records, padding_count, plan_batch};
