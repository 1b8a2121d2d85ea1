use chrono::prelude::*;
use std::collections::HashMap;

use calamine::Data;
use semver::Version;
use thiserror::Error;

use crate::workbook::FleetBook;

pub mod plot;
pub mod workbook;
#[cfg(test)]
pub(crate) mod testutil;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Layout of the date sheet names, e.g. "20200101".
pub const DATE_SHEET_FORMAT: &str = "%Y%m%d";
/// Name of the OS version catalog sheet.
pub const OS_CATALOG_SHEET: &str = "OSVer";
/// The first three sheets hold the version and modification catalogs,
/// everything after them is one daily snapshot per sheet.
pub const FIRST_DATE_SHEET: usize = 3;
/// The catalog sheet has a single header row.
pub const CATALOG_HEADER_ROWS: u32 = 1;
/// The daily sheets have a two-row header.
pub const DAILY_HEADER_ROWS: u32 = 2;

pub const MAJOR_V1: &str = "1.x";
pub const MAJOR_V2: &str = "2.x";
pub const MC_CAPABLE: &str = "mc-capable";
pub const NON_MC_CAPABLE: &str = "non-mc-capable";

/// Everything that can go wrong between opening the workbook and having
/// a complete series mapping; all of these abort the run.
#[derive(Error, Debug)]
pub enum VersionPlotError {
    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::XlsError),
    #[error("workbook has no sheet named {0:?}")]
    MissingSheet(String),
    #[error("sheet name {0:?} is not a YYYYMMDD date")]
    SheetDate(String),
    #[error("workbook has no date sheets to aggregate")]
    NoDateSheets,
    #[error("version {version:?} appears in the daily counts but not in the version catalog")]
    UnknownVersion { version: String },
    #[error("date {date} is missing from the series for {key:?}")]
    MissingDate { key: String, date: NaiveDate },
    #[error("version {version:?} is not a semantic version: {source}")]
    BadVersion {
        version: String,
        source: semver::Error,
    },
    #[error("sheet {sheet:?} row {row}: expected a version string in column 0")]
    BadVersionCell { sheet: String, row: u32 },
    #[error("sheet {sheet:?} row {row}: expected an integer count in column 2")]
    BadCount { sheet: String, row: u32 },
}

/// Daily device counts for one key, kept as parallel date and count columns.
#[derive(Debug, Clone)]
pub struct TimeCounts {
    pub time: Vec<NaiveDate>,
    pub count: Vec<i64>,
}

impl TimeCounts {
    /// A series over the given dates with every count at zero.
    pub fn zeroed(dates: &[NaiveDate]) -> TimeCounts {
        TimeCounts {
            time: dates.to_vec(),
            count: vec![0; dates.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn max_count(&self) -> i64 {
        self.count.iter().copied().max().unwrap_or(0)
    }

    fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.time.iter().position(|&d| d == date)
    }
}

/// The series mapping: one [`TimeCounts`] per catalog version plus the four
/// derived keys, iterated in insertion order so plots and markers come out
/// the same on every run.
#[derive(Debug, Clone, Default)]
pub struct VersionCounts {
    order: Vec<(String, TimeCounts)>,
    index: HashMap<String, usize>,
}

impl VersionCounts {
    pub fn new() -> VersionCounts {
        VersionCounts {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers `key` with a fresh zero-count clone of `template`.
    /// A re-registered key keeps its position but starts over from zero.
    pub fn insert_zeroed(&mut self, key: &str, template: &TimeCounts) {
        match self.index.get(key) {
            Some(&i) => self.order[i].1 = template.clone(),
            None => {
                self.index.insert(key.to_string(), self.order.len());
                self.order.push((key.to_string(), template.clone()));
            }
        }
    }

    /// Adds `n` to the entry for `key` at `date`; counts accumulate,
    /// they are never overwritten.
    pub fn add_count(
        &mut self,
        key: &str,
        date: NaiveDate,
        n: i64,
    ) -> Result<(), VersionPlotError> {
        let &i = self
            .index
            .get(key)
            .ok_or_else(|| VersionPlotError::UnknownVersion {
                version: key.to_string(),
            })?;
        let series = &mut self.order[i].1;
        match series.day_index(date) {
            Some(day) => {
                series.count[day] += n;
                Ok(())
            }
            None => Err(VersionPlotError::MissingDate {
                key: key.to_string(),
                date,
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TimeCounts> {
        self.index.get(key).map(|&i| &self.order[i].1)
    }

    /// Keys and series in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimeCounts)> + '_ {
        self.order.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Converts a sheet name in YYYYMMDD format into a calendar date.
pub fn sheet_date(name: &str) -> Result<NaiveDate, VersionPlotError> {
    if name.len() != 8 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionPlotError::SheetDate(name.to_string()));
    }
    NaiveDate::parse_from_str(name, DATE_SHEET_FORMAT)
        .map_err(|_| VersionPlotError::SheetDate(name.to_string()))
}

/// Buckets a version into its major series by the leading character:
/// "2.x" for the 2 series, everything else counts as "1.x".
pub fn major_key(version: &str) -> &'static str {
    if version.starts_with('2') {
        MAJOR_V2
    } else {
        MAJOR_V1
    }
}

/// Whether the version can run multiple containers, i.e. is at least
/// 2.12.0 under semantic version precedence. Pre-releases of 2.12.0 sort
/// below it and are not capable; build metadata does not matter.
pub fn mc_capable(version: &str) -> Result<bool, VersionPlotError> {
    let parsed = Version::parse(version).map_err(|source| VersionPlotError::BadVersion {
        version: version.to_string(),
        source,
    })?;
    Ok(parsed >= Version::new(2, 12, 0))
}

/// Builds the version count time series from the given fleet score workbook.
///
/// Every version in the catalog sheet and the four derived keys get a series
/// with one zero-initialized entry per date sheet, then the daily rows are
/// summed in: each row counts towards its exact version, its major version
/// and its multicontainer capability.
pub fn load_counts<B: FleetBook>(book: &mut B) -> Result<VersionCounts, VersionPlotError> {
    let date_sheets: Vec<String> = book
        .sheet_names()
        .into_iter()
        .skip(FIRST_DATE_SHEET)
        .collect();
    if date_sheets.is_empty() {
        return Err(VersionPlotError::NoDateSheets);
    }
    let mut dates = Vec::with_capacity(date_sheets.len());
    for name in &date_sheets {
        dates.push(sheet_date(name)?);
    }
    let template = TimeCounts::zeroed(&dates);

    let mut counts = VersionCounts::new();
    let catalog = book.worksheet(OS_CATALOG_SHEET)?;
    if let Some((last, _)) = catalog.end() {
        for row in CATALOG_HEADER_ROWS..=last {
            match catalog.get_value((row, 0)) {
                Some(Data::String(v)) if !v.is_empty() => counts.insert_zeroed(v, &template),
                Some(Data::String(_)) | Some(Data::Empty) | None => {}
                Some(_) => {
                    return Err(VersionPlotError::BadVersionCell {
                        sheet: OS_CATALOG_SHEET.to_string(),
                        row,
                    })
                }
            }
        }
    }
    for key in &[MAJOR_V1, MAJOR_V2, MC_CAPABLE, NON_MC_CAPABLE] {
        counts.insert_zeroed(key, &template);
    }

    for (name, &day) in date_sheets.iter().zip(dates.iter()) {
        let sheet = book.worksheet(name)?;
        let last = match sheet.end() {
            Some((last, _)) => last,
            None => continue,
        };
        for row in DAILY_HEADER_ROWS..=last {
            let version_cell = sheet.get_value((row, 0));
            let count_cell = sheet.get_value((row, 2));
            if blank(version_cell) && blank(count_cell) {
                continue;
            }
            let version = match version_cell {
                Some(Data::String(v)) if !v.is_empty() => v.as_str(),
                _ => {
                    return Err(VersionPlotError::BadVersionCell {
                        sheet: name.clone(),
                        row,
                    })
                }
            };
            let n = match count_cell {
                Some(Data::Int(n)) => *n,
                Some(Data::Float(f)) if f.is_finite() => *f as i64,
                Some(Data::String(s)) => match s.trim().parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => {
                        return Err(VersionPlotError::BadCount {
                            sheet: name.clone(),
                            row,
                        })
                    }
                },
                _ => {
                    return Err(VersionPlotError::BadCount {
                        sheet: name.clone(),
                        row,
                    })
                }
            };
            counts.add_count(version, day, n)?;
            counts.add_count(major_key(version), day, n)?;
            let capability = if mc_capable(version)? {
                MC_CAPABLE
            } else {
                NON_MC_CAPABLE
            };
            counts.add_count(capability, day, n)?;
        }
    }
    Ok(counts)
}

fn blank(cell: Option<&Data>) -> bool {
    matches!(cell, None | Some(Data::Empty))
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> (T, T) {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => panic!("could not iterate over slice"),
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    return (min, max);
}
