use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xls};

use crate::VersionPlotError;

/// Source of fleet score sheets. The one real implementation wraps a
/// legacy .xls workbook; tests substitute an in-memory book.
pub trait FleetBook {
    /// All sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;
    /// The full cell range of the named sheet.
    fn worksheet(&mut self, name: &str) -> Result<Range<Data>, VersionPlotError>;
}

/// A legacy .xls workbook opened from disk.
pub struct XlsFleetBook {
    book: Xls<BufReader<File>>,
}

impl XlsFleetBook {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<XlsFleetBook, VersionPlotError> {
        let book: Xls<_> = open_workbook(path)?;
        Ok(XlsFleetBook { book })
    }
}

impl FleetBook for XlsFleetBook {
    fn sheet_names(&self) -> Vec<String> {
        self.book.sheet_names()
    }

    fn worksheet(&mut self, name: &str) -> Result<Range<Data>, VersionPlotError> {
        if !self.book.sheet_names().iter().any(|n| n == name) {
            return Err(VersionPlotError::MissingSheet(name.to_string()));
        }
        Ok(self.book.worksheet_range(name)?)
    }
}
