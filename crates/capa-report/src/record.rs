//! Record normalizer: positional sheet rows to typed CAPA records.

use serde::Serialize;

use crate::split::split_owners;

/// Column positions in the CAPA ledger tab (0-based, columns A..X).
mod col {
    pub const NUMBER: usize = 0;
    pub const REFERENCE_DOC: usize = 1;
    pub const CAPA_NO: usize = 2;
    pub const SOURCE: usize = 3;
    pub const LOCATION: usize = 5;
    pub const ROOT_CAUSE: usize = 8;
    pub const DESCRIPTION: usize = 15;
    pub const PIC: usize = 16;
    pub const DEPARTMENT: usize = 17;
    pub const TARGET_DATE: usize = 18;
    pub const REMARKS: usize = 22;
    pub const STATUS: usize = 23;
}

/// Workflow status of a CAPA item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Open,
    Closed,
    /// Status cell is empty.
    Missing,
}

impl Status {
    fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            None => Self::Missing,
            Some(s) if s.eq_ignore_ascii_case("OPEN") => Self::Open,
            Some(_) => Self::Closed,
        }
    }
}

/// A normalized CAPA ledger row. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapaRecord {
    /// Row number as written in column A (may be empty).
    pub number: String,
    pub reference_doc: Option<String>,
    pub capa_no: Option<String>,
    /// Source category ("Sumber CAPA").
    pub source: Option<String>,
    pub location: Option<String>,
    pub root_cause: Option<String>,
    pub description: Option<String>,
    /// Upper-cased; may hold several owners separated by `,` or `/`.
    pub pic: Option<String>,
    /// Upper-cased; may hold several departments separated by `,` or `/`.
    pub department: Option<String>,
    /// Free text, expected as `DD MMM YYYY`.
    pub target_date: Option<String>,
    pub remarks: Option<String>,
    pub status: Status,
}

fn cell(row: &[String], idx: usize) -> Option<String> {
    row.get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl CapaRecord {
    /// Build a record from a raw row. Short rows are fine.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            number: cell(row, col::NUMBER).unwrap_or_default(),
            reference_doc: cell(row, col::REFERENCE_DOC),
            capa_no: cell(row, col::CAPA_NO),
            source: cell(row, col::SOURCE),
            location: cell(row, col::LOCATION),
            root_cause: cell(row, col::ROOT_CAUSE),
            description: cell(row, col::DESCRIPTION),
            pic: cell(row, col::PIC).map(|s| s.to_uppercase()),
            department: cell(row, col::DEPARTMENT).map(|s| s.to_uppercase()),
            target_date: cell(row, col::TARGET_DATE),
            remarks: cell(row, col::REMARKS),
            status: Status::from_cell(cell(row, col::STATUS).as_deref()),
        }
    }

    /// True when nothing but the row number is filled in.
    pub fn is_blank(&self) -> bool {
        self.reference_doc.is_none()
            && self.capa_no.is_none()
            && self.source.is_none()
            && self.location.is_none()
            && self.root_cause.is_none()
            && self.description.is_none()
            && self.pic.is_none()
            && self.department.is_none()
            && self.target_date.is_none()
            && self.remarks.is_none()
            && self.status == Status::Missing
    }

    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// Leaf text used in every grouped report: `"description (target date)"`.
    pub fn leaf(&self) -> String {
        format!(
            "{} ({})",
            self.description.as_deref().unwrap_or("-"),
            self.target_date.as_deref().unwrap_or("-")
        )
    }

    /// Split PIC names; empty when no PIC is set.
    pub fn pics(&self) -> Vec<String> {
        self.pic.as_deref().map(split_owners).unwrap_or_default()
    }

    /// Split department names; empty when no department is set.
    pub fn departments(&self) -> Vec<String> {
        self.department.as_deref().map(split_owners).unwrap_or_default()
    }

    /// Source category for grouping, `-` when missing.
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or("-")
    }
}

/// Normalize every row and drop blank ones. Order is preserved.
pub fn normalize_rows(rows: &[Vec<String>]) -> Vec<CapaRecord> {
    rows.iter()
        .map(|row| CapaRecord::from_row(row))
        .filter(|r| !r.is_blank())
        .collect()
}

/// Keep only records with status `OPEN`.
pub fn open_records(records: &[CapaRecord]) -> Vec<CapaRecord> {
    records.iter().filter(|r| r.is_open()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 24-column row from `(column, value)` pairs.
    pub(crate) fn row(cells: &[(usize, &str)]) -> Vec<String> {
        let mut row = vec![String::new(); 24];
        for (idx, value) in cells {
            row[*idx] = value.to_string();
        }
        row
    }

    #[test]
    fn test_from_row_maps_columns() {
        let r = CapaRecord::from_row(&row(&[
            (0, "7"),
            (3, "QRM"),
            (15, " fix valve "),
            (16, "ab, cd"),
            (17, "prod"),
            (18, "10 Mar 2024"),
            (23, "open"),
        ]));
        assert_eq!(r.number, "7");
        assert_eq!(r.source.as_deref(), Some("QRM"));
        assert_eq!(r.description.as_deref(), Some("fix valve"));
        assert_eq!(r.pic.as_deref(), Some("AB, CD"));
        assert_eq!(r.department.as_deref(), Some("PROD"));
        assert_eq!(r.status, Status::Open);
        assert_eq!(r.leaf(), "fix valve (10 Mar 2024)");
    }

    #[test]
    fn test_short_row_defaults_to_none() {
        let r = CapaRecord::from_row(&["12".to_string(), "DOC-1".to_string()]);
        assert_eq!(r.number, "12");
        assert_eq!(r.reference_doc.as_deref(), Some("DOC-1"));
        assert!(r.pic.is_none());
        assert!(r.department.is_none());
        assert_eq!(r.status, Status::Missing);
        assert!(!r.is_blank());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(Status::from_cell(Some("OPEN")), Status::Open);
        assert_eq!(Status::from_cell(Some("Open")), Status::Open);
        assert_eq!(Status::from_cell(Some("CLOSE")), Status::Closed);
        assert_eq!(Status::from_cell(None), Status::Missing);
    }

    #[test]
    fn test_whitespace_cells_are_missing() {
        let r = CapaRecord::from_row(&row(&[(0, "3"), (16, "   "), (23, " ")]));
        assert!(r.pic.is_none());
        assert_eq!(r.status, Status::Missing);
    }

    #[test]
    fn test_blank_rows_are_discarded() {
        let rows = vec![
            row(&[(0, "1")]),
            row(&[]),
            vec![],
            row(&[(0, "2"), (16, "AB"), (23, "OPEN")]),
        ];
        let records = normalize_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, "2");
    }

    #[test]
    fn test_leaf_uses_dash_for_missing() {
        let r = CapaRecord::from_row(&row(&[(0, "1"), (23, "OPEN")]));
        assert_eq!(r.leaf(), "- (-)");
        assert_eq!(r.source_key(), "-");
    }

    #[test]
    fn test_open_records_filter() {
        let rows = vec![
            row(&[(0, "1"), (16, "A"), (23, "OPEN")]),
            row(&[(0, "2"), (16, "B"), (23, "CLOSED")]),
            row(&[(0, "3"), (16, "C")]),
        ];
        let open = open_records(&normalize_rows(&rows));
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].pic.as_deref(), Some("A"));
    }

    #[test]
    fn test_owner_lists() {
        let r = CapaRecord::from_row(&row(&[(0, "1"), (16, "a/ b"), (17, "prod"), (23, "OPEN")]));
        assert_eq!(r.pics(), vec!["A", "B"]);
        assert_eq!(r.departments(), vec!["PROD"]);

        let empty = CapaRecord::from_row(&row(&[(0, "2"), (23, "OPEN")]));
        assert!(empty.pics().is_empty());
        assert!(empty.departments().is_empty());
    }
}
