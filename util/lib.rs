/*!
This crate contains small utilities shared by the other failcast crates: a thread-safe progress counter used to report training progress through callbacks, and a plain text table renderer used by the cli to print reports.
*/

pub mod progress_counter;
pub mod table;

pub use self::progress_counter::ProgressCounter;
pub use self::table::Table;
