//! Phone directory: PIC name to contact number and superior.

use serde::Serialize;

mod col {
    pub const NAME: usize = 3;
    pub const PHONE: usize = 4;
    pub const SUPERIOR: usize = 5;
    pub const SLOT: usize = 6;
}

/// Contact details for one PIC or supervisor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub phone: String,
    /// Upper-cased superior name, empty when not set.
    pub superior: String,
    /// Resolved from the superior's own entry; empty when the superior is unknown.
    pub superior_phone: String,
    pub slot: Option<String>,
}

/// Name-keyed contact table built from the directory tab.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    // Ordered by first appearance; small enough for linear scans.
    entries: Vec<(String, DirectoryEntry)>,
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn key(name: &str) -> String {
    name.trim().to_uppercase()
}

impl Directory {
    /// Build the directory from raw rows. Row 0 is the header and is skipped.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut dir = Self::default();

        for row in rows.iter().skip(1) {
            let name = key(&cell(row, col::NAME));
            if name.is_empty() {
                continue;
            }
            let slot = Some(cell(row, col::SLOT)).filter(|s| !s.is_empty());
            let entry = DirectoryEntry {
                phone: cell(row, col::PHONE),
                superior: key(&cell(row, col::SUPERIOR)),
                superior_phone: String::new(),
                slot,
            };
            dir.insert(name, entry);
        }

        // Second pass: the superior's phone comes from the superior's own row.
        let phones: Vec<String> = dir
            .entries
            .iter()
            .map(|(_, e)| {
                dir.lookup(&e.superior)
                    .map(|sup| sup.phone.clone())
                    .unwrap_or_default()
            })
            .collect();
        for ((_, entry), phone) in dir.entries.iter_mut().zip(phones) {
            entry.superior_phone = phone;
        }

        dir
    }

    fn insert(&mut self, name: String, entry: DirectoryEntry) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    /// Case-insensitive lookup. Empty names never match.
    pub fn lookup(&self, name: &str) -> Option<&DirectoryEntry> {
        let name = key(name);
        if name.is_empty() {
            return None;
        }
        self.entries.iter().find(|(k, _)| *k == name).map(|(_, e)| e)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Names of every entry assigned to `slot`, in directory order.
    pub fn in_slot(&self, slot: &str) -> Vec<String> {
        let slot = slot.trim();
        self.entries
            .iter()
            .filter(|(_, e)| e.slot.as_deref() == Some(slot))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, phone: &str, superior: &str, slot: &str) -> Vec<String> {
        vec![
            "1".into(),
            "PROD".into(),
            "L1".into(),
            name.into(),
            phone.into(),
            superior.into(),
            slot.into(),
        ]
    }

    fn header() -> Vec<String> {
        ["No", "Dept", "Line", "SPV", "No WA", "Atasan", "Slot"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_superior_phone_resolved() {
        let dir = Directory::from_rows(&[
            header(),
            row("r", "082222222222", "x", ""),
            row("X", "081100000000", "", ""),
        ]);
        let r = dir.lookup("R").unwrap();
        assert_eq!(r.superior, "X");
        assert_eq!(r.superior_phone, "081100000000");
    }

    #[test]
    fn test_unknown_superior_is_empty() {
        let dir = Directory::from_rows(&[header(), row("R", "082222222222", "NOBODY", "")]);
        assert_eq!(dir.lookup("r").unwrap().superior_phone, "");
    }

    #[test]
    fn test_header_row_skipped() {
        let dir = Directory::from_rows(&[header()]);
        assert!(dir.is_empty());
        assert!(dir.lookup("SPV").is_none());
    }

    #[test]
    fn test_lookup_missing_never_panics() {
        let dir = Directory::from_rows(&[]);
        assert!(dir.lookup("A").is_none());
        assert!(dir.lookup("").is_none());
        assert!(!dir.contains("A"));
    }

    #[test]
    fn test_short_rows_and_empty_names() {
        let dir = Directory::from_rows(&[
            header(),
            vec!["1".into(), "PROD".into(), "L1".into(), "A".into()],
            vec!["2".into()],
        ]);
        assert_eq!(dir.len(), 1);
        let a = dir.lookup("A").unwrap();
        assert_eq!(a.phone, "");
        assert_eq!(a.superior, "");
        assert_eq!(a.slot, None);
    }

    #[test]
    fn test_duplicate_names_overwrite() {
        let dir = Directory::from_rows(&[
            header(),
            row("A", "081111111111", "", ""),
            row("a", "089999999999", "", ""),
        ]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.lookup("A").unwrap().phone, "089999999999");
    }

    #[test]
    fn test_in_slot() {
        let dir = Directory::from_rows(&[
            header(),
            row("A", "081111111111", "", "1"),
            row("B", "082222222222", "", "2"),
            row("C", "083333333333", "", "1"),
        ]);
        assert_eq!(dir.in_slot("1"), vec!["A", "C"]);
        assert_eq!(dir.in_slot("2"), vec!["B"]);
        assert!(dir.in_slot("3").is_empty());
    }
}
