//! # capa-report
//!
//! Turns raw CAPA spreadsheet rows into grouped, rendered reminder messages.
//!
//! Everything here is pure: rows in, strings out. Fetching rows and
//! delivering messages belongs to the caller.

pub mod directory;
pub mod eligibility;
pub mod group;
pub mod phone;
pub mod record;
pub mod render;
pub mod report;
pub mod split;
pub mod validation;

pub use directory::{Directory, DirectoryEntry};
pub use eligibility::{Eligible, Scope};
pub use group::{group_by_department, group_by_pic, KeyFilter, NO_DEPT, NO_PIC};
pub use phone::is_valid_phone;
pub use record::{normalize_rows, open_records, CapaRecord, Status};
pub use render::{Contact, Reminder};
pub use report::{Node, Report, ReportBuilder};
pub use split::split_owners;
pub use validation::{check, CheckSummary};
