//! Grouping aggregator: records into `PIC → source → lines` reports.

use crate::record::CapaRecord;
use crate::report::{Report, ReportBuilder};
use crate::split::split_owners;

/// Group key for records without a PIC.
pub const NO_PIC: &str = "NOPIC";
/// Group key for records without a department.
pub const NO_DEPT: &str = "NODEPT";

/// Restricts which owner keys survive after splitting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyFilter {
    #[default]
    Any,
    /// Keep only this key (compared upper-cased).
    Only(String),
}

impl KeyFilter {
    pub fn only(key: &str) -> Self {
        Self::Only(key.trim().to_uppercase())
    }

    fn keeps(&self, key: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted == key,
        }
    }
}

fn owners(field: Option<&str>, missing: &str) -> Vec<String> {
    let keys = field.map(split_owners).unwrap_or_default();
    if keys.is_empty() {
        vec![missing.to_string()]
    } else {
        keys
    }
}

/// `PIC → source → ["description (date)"]`, one branch per split PIC.
pub fn group_by_pic(records: &[CapaRecord], filter: &KeyFilter) -> Report {
    let mut builder = ReportBuilder::new();
    for record in records {
        let leaf = record.leaf();
        for pic in owners(record.pic.as_deref(), NO_PIC) {
            if filter.keeps(&pic) {
                builder.append(&[pic.as_str(), record.source_key()], leaf.as_str());
            }
        }
    }
    builder.build()
}

/// `DEPT → PIC → source → [...]`. The filter applies to departments.
pub fn group_by_department(records: &[CapaRecord], filter: &KeyFilter) -> Report {
    let mut builder = ReportBuilder::new();
    for record in records {
        let leaf = record.leaf();
        let pics = owners(record.pic.as_deref(), NO_PIC);
        for dept in owners(record.department.as_deref(), NO_DEPT) {
            if !filter.keeps(&dept) {
                continue;
            }
            for pic in &pics {
                builder.append(&[dept.as_str(), pic.as_str(), record.source_key()], leaf.as_str());
            }
        }
    }
    builder.build()
}
