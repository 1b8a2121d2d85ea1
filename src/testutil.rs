use calamine::{Data, Range};

use crate::workbook::FleetBook;
use crate::{VersionPlotError, OS_CATALOG_SHEET};

/// In-memory workbook mirroring the sheet layout of the fleet score
/// spreadsheets, so the aggregation can be tested without .xls fixtures.
pub(crate) struct MemBook {
    sheets: Vec<(String, Range<Data>)>,
}

impl MemBook {
    pub(crate) fn new(sheets: Vec<(String, Range<Data>)>) -> MemBook {
        MemBook { sheets }
    }

    /// A workbook with the standard three catalog sheets followed by one
    /// sheet per day, populated from (version, count) rows.
    pub(crate) fn fleet(versions: &[&str], days: &[(&str, Vec<(&str, i64)>)]) -> MemBook {
        let mut sheets = vec![
            ("SupervisorVer".to_string(), catalog_sheet(&[])),
            (OS_CATALOG_SHEET.to_string(), catalog_sheet(versions)),
            ("Mods".to_string(), catalog_sheet(&[])),
        ];
        for (name, rows) in days {
            sheets.push((name.to_string(), daily_sheet(rows)));
        }
        MemBook { sheets }
    }

    pub(crate) fn push_sheet(&mut self, name: &str, range: Range<Data>) {
        self.sheets.push((name.to_string(), range));
    }
}

impl FleetBook for MemBook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(n, _)| n.clone()).collect()
    }

    fn worksheet(&mut self, name: &str) -> Result<Range<Data>, VersionPlotError> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| VersionPlotError::MissingSheet(name.to_string()))
    }
}

/// A catalog sheet: one header row, one version per row in column 0.
pub(crate) fn catalog_sheet(versions: &[&str]) -> Range<Data> {
    let last_row = versions.len() as u32;
    let mut range = Range::new((0, 0), (last_row, 2));
    range.set_value((0, 0), Data::String("version".to_string()));
    for (i, v) in versions.iter().enumerate() {
        range.set_value((i as u32 + 1, 0), Data::String(v.to_string()));
    }
    range
}

/// A daily sheet: two header rows, then (version, score, count) rows.
/// Counts are stored as floats, the way the spreadsheets have them.
pub(crate) fn daily_sheet(rows: &[(&str, i64)]) -> Range<Data> {
    let last_row = rows.len() as u32 + 1;
    let mut range = Range::new((0, 0), (last_row, 2));
    range.set_value((0, 0), Data::String("OS version scores".to_string()));
    range.set_value((1, 0), Data::String("version".to_string()));
    range.set_value((1, 1), Data::String("score".to_string()));
    range.set_value((1, 2), Data::String("count".to_string()));
    for (i, (v, n)) in rows.iter().enumerate() {
        let row = i as u32 + 2;
        range.set_value((row, 0), Data::String(v.to_string()));
        range.set_value((row, 1), Data::Float(0.5));
        range.set_value((row, 2), Data::Float(*n as f64));
    }
    range
}
