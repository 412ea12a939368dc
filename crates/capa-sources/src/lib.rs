//! Upstream data sources: the CAPA spreadsheet and the public holiday calendar.

pub mod holidays;
pub mod sheets;

pub use holidays::HolidayApiClient;
pub use sheets::GoogleSheetsClient;
