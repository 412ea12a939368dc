//! One consistent read of both spreadsheet tabs.

use capa_core::{error::CapaError, traits::SheetSource};
use capa_report::{normalize_rows, CapaRecord, Directory};

/// Normalized CAPA records (blank rows dropped) and the phone directory.
pub struct Ledger {
    pub records: Vec<CapaRecord>,
    pub directory: Directory,
}

impl Ledger {
    /// Read the CAPA and directory tabs concurrently.
    pub async fn fetch(sheets: &dyn SheetSource) -> Result<Self, CapaError> {
        let (capa_rows, directory_rows) =
            tokio::try_join!(sheets.capa_rows(), sheets.directory_rows())?;
        Ok(Self {
            records: normalize_rows(&capa_rows),
            directory: Directory::from_rows(&directory_rows),
        })
    }

    pub fn open(&self) -> Vec<CapaRecord> {
        capa_report::open_records(&self.records)
    }
}
