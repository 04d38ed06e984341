pub mod submission;
pub mod export;

pub use submission::{SavedLineup, SavedRoster, validate_lines_submission, validate_lineup_order, validate_order_field};
pub use export::{export_file_name, export_lineup_to_csv, write_lineup_csv};
