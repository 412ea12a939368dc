//! Data-quality summary behind `!checkcapa`.

use serde::Serialize;

use crate::directory::Directory;
use crate::record::{CapaRecord, Status};
use crate::split::split_owners;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckSummary {
    /// Row numbers with an empty status cell.
    pub no_status: Vec<String>,
    /// Row numbers of open CAPAs with nobody assigned.
    pub open_without_pic: Vec<String>,
    /// PIC names on open CAPAs that have no directory entry, first-seen order.
    pub unknown_pics: Vec<String>,
}

impl CheckSummary {
    pub fn is_clean(&self) -> bool {
        self.no_status.is_empty() && self.open_without_pic.is_empty() && self.unknown_pics.is_empty()
    }
}

/// Validate normalized (non-blank) records against the directory.
pub fn check(records: &[CapaRecord], directory: &Directory) -> CheckSummary {
    let mut summary = CheckSummary::default();

    for record in records {
        match record.status {
            Status::Missing => summary.no_status.push(record.number.clone()),
            Status::Closed => {}
            Status::Open => {
                let pics = record.pic.as_deref().map(split_owners).unwrap_or_default();
                if pics.is_empty() {
                    summary.open_without_pic.push(record.number.clone());
                    continue;
                }
                for pic in pics {
                    if !directory.contains(&pic) && !summary.unknown_pics.contains(&pic) {
                        summary.unknown_pics.push(pic);
                    }
                }
            }
        }
    }

    summary
}
