//! Workbook session: one open workbook, one backup, scoped teardown.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use umya_spreadsheet::{CellRawValue, Spreadsheet, Worksheet};

use crate::error::{Result, SessionError};
use crate::value::CellValue;

/// A session bound to one `.xlsx` file.
///
/// Opening a session reads the workbook, writes a timestamped backup copy
/// next to it, and keeps the workbook in memory for cell access. The session
/// saves the workbook back to its path when it is closed or dropped, so edits
/// survive every exit path; [`WorkbookSession::restore`] rewinds the file to
/// the backed-up content instead.
///
/// The backup name is the integer Unix timestamp prefixed onto the whole path
/// string (`report.xlsx` -> `1700000000_report.xlsx`). Because the prefix is
/// applied to directory components too, paths with directories produce backup
/// paths in a directory that does not exist; callers are expected to open
/// sessions on bare file names relative to the working directory. Two sessions
/// opened on the same path within the same second collide on the backup name,
/// and the later write wins.
pub struct WorkbookSession {
    path: String,
    backup_path: String,
    book: Spreadsheet,
    closed: bool,
}

impl WorkbookSession {
    /// Open the workbook at `path` and write its session-start backup.
    ///
    /// Fails with [`SessionError::InvalidPath`] before touching the
    /// filesystem if `path` does not end in `.xlsx` (case-sensitive).
    pub fn open(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        verify_path(&path)?;

        let book = read_workbook(&path)?;
        let (book, backup_path) = Self::store_backup(book, &path)?;
        tracing::debug!("opened workbook session: {} (backup: {})", path, backup_path);

        Ok(Self {
            path,
            backup_path,
            book,
            closed: false,
        })
    }

    /// Path of the primary workbook file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of the backup written at session start.
    pub fn backup_path(&self) -> &str {
        &self.backup_path
    }

    /// Names of the worksheets in the open workbook.
    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    /// An opaque handle to the referenced cell range on `sheet`.
    ///
    /// `cell_ref` is passed through otherwise uninterpreted: the only local
    /// processing is resolving its endpoints to numeric coordinates, since
    /// the underlying library addresses cells numerically. References whose
    /// endpoints cannot be resolved fail with
    /// [`SessionError::InvalidCellRef`].
    pub fn get_cell(&self, sheet: &str, cell_ref: &str) -> Result<CellRange<'_>> {
        let bounds = RangeBounds::parse(cell_ref)?;
        let ws = self
            .book
            .get_sheet_by_name(sheet)
            .ok_or_else(|| SessionError::SheetNotFound(sheet.to_string()))?;
        Ok(CellRange {
            sheet: ws,
            bounds,
            address: cell_ref.to_string(),
        })
    }

    /// The current value of the referenced range: a scalar for a single cell,
    /// [`CellValue::Table`] rows for a multi-cell range.
    pub fn read_cell(&self, sheet: &str, cell_ref: &str) -> Result<CellValue> {
        Ok(self.get_cell(sheet, cell_ref)?.value())
    }

    /// Write `value` into the referenced range.
    ///
    /// Scalars are broadcast to every cell in the range; a
    /// [`CellValue::Table`] is written row-major anchored at the range's
    /// top-left cell. [`CellValue::Empty`] removes cells. The edit stays
    /// in memory until the next save, restore, close, or drop.
    pub fn set_cell(
        &mut self,
        sheet: &str,
        cell_ref: &str,
        value: impl Into<CellValue>,
    ) -> Result<()> {
        let value = value.into();
        let bounds = RangeBounds::parse(cell_ref)?;
        let ws = self
            .book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| SessionError::SheetNotFound(sheet.to_string()))?;

        match value {
            CellValue::Table(rows) => {
                for (r, row) in rows.iter().enumerate() {
                    for (c, cell) in row.iter().enumerate() {
                        let coord = (bounds.min_col + c as u32, bounds.min_row + r as u32);
                        write_scalar(ws, coord, cell)?;
                    }
                }
            }
            scalar => {
                for row in bounds.min_row..=bounds.max_row {
                    for col in bounds.min_col..=bounds.max_col {
                        write_scalar(ws, (col, row), &scalar)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Persist the current in-memory state to the primary path.
    pub fn save(&self) -> Result<()> {
        write_workbook(&self.book, &self.path)
    }

    /// Discard the current workbook state and reload from the backup.
    ///
    /// The backup content is reopened, written back over the primary path,
    /// and becomes the session's workbook; unsaved edits are lost. If the
    /// backup file has gone missing the open error propagates unchanged and
    /// the current workbook stays in place.
    pub fn restore(&mut self) -> Result<()> {
        tracing::debug!("restoring workbook {} from {}", self.path, self.backup_path);
        let book = read_workbook(&self.backup_path)?;
        write_workbook(&book, &self.path)?;
        self.book = book;
        Ok(())
    }

    /// End the session, saving the workbook and surfacing the save error.
    ///
    /// Dropping the session saves too; `close` exists so the caller can
    /// observe a failed final save instead of it being logged and swallowed.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        write_workbook(&self.book, &self.path)
    }

    /// Save to `path`, then write the timestamped backup copy, then reopen
    /// `path` fresh so the session continues against the primary file.
    fn store_backup(book: Spreadsheet, path: &str) -> Result<(Spreadsheet, String)> {
        write_workbook(&book, path)?;

        let backup_path = backup_path_for(path, Utc::now().timestamp());
        write_workbook(&book, &backup_path)?;
        tracing::debug!("wrote workbook backup: {}", backup_path);

        drop(book);
        let book = read_workbook(path)?;
        Ok((book, backup_path))
    }
}

impl fmt::Debug for WorkbookSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The in-memory workbook is too large to dump.
        f.debug_struct("WorkbookSession")
            .field("path", &self.path)
            .field("backup_path", &self.backup_path)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Drop for WorkbookSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = write_workbook(&self.book, &self.path) {
            tracing::error!("failed to save workbook {} on teardown: {}", self.path, err);
        }
    }
}

/// An opaque handle to one or more cells on a worksheet.
pub struct CellRange<'a> {
    sheet: &'a Worksheet,
    bounds: RangeBounds,
    address: String,
}

impl CellRange<'_> {
    /// The address string this range was created from.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Name of the worksheet the range lives on.
    pub fn sheet_name(&self) -> &str {
        self.sheet.get_name()
    }

    /// The value(s) held in the range: a scalar for a single cell, table
    /// rows for anything larger. Unset cells read as [`CellValue::Empty`].
    pub fn value(&self) -> CellValue {
        if self.bounds.is_single_cell() {
            return read_scalar(self.sheet, (self.bounds.min_col, self.bounds.min_row));
        }
        let rows = (self.bounds.min_row..=self.bounds.max_row)
            .map(|row| {
                (self.bounds.min_col..=self.bounds.max_col)
                    .map(|col| read_scalar(self.sheet, (col, row)))
                    .collect()
            })
            .collect();
        CellValue::Table(rows)
    }
}

// ============================================================================
// Path handling
// ============================================================================

fn verify_path(path: &str) -> Result<()> {
    if !path.ends_with(".xlsx") {
        return Err(SessionError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Backup path for `path` at `timestamp`: the timestamp is prefixed onto the
/// whole path string, directory components included.
fn backup_path_for(path: &str, timestamp: i64) -> String {
    format!("{timestamp}_{path}")
}

fn read_workbook(path: &str) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(Path::new(path)).map_err(SessionError::from)
}

fn write_workbook(book: &Spreadsheet, path: &str) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, Path::new(path)).map_err(SessionError::from)
}

// ============================================================================
// Cell access
// ============================================================================

fn read_scalar(sheet: &Worksheet, coordinate: (u32, u32)) -> CellValue {
    let Some(cell) = sheet.get_cell(coordinate) else {
        return CellValue::Empty;
    };
    match cell.get_raw_value() {
        CellRawValue::Numeric(n) => CellValue::Number(*n),
        CellRawValue::Bool(b) => CellValue::Bool(*b),
        CellRawValue::Empty => CellValue::Empty,
        // Strings, rich text, formula results, errors: surface the display
        // string the workbook holds for the cell.
        _ => CellValue::Text(cell.get_value().to_string()),
    }
}

fn write_scalar(sheet: &mut Worksheet, coordinate: (u32, u32), value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => {
            sheet.remove_cell(coordinate);
        }
        CellValue::Number(n) => {
            sheet.get_cell_mut(coordinate).set_value_number(*n);
        }
        CellValue::Bool(b) => {
            sheet.get_cell_mut(coordinate).set_value_bool(*b);
        }
        CellValue::Text(s) => {
            sheet.get_cell_mut(coordinate).set_value_string(s.as_str());
        }
        CellValue::Table(_) => {
            return Err(SessionError::OperationFailed(
                "table rows must contain scalar values, not nested tables".to_string(),
            ));
        }
    }
    Ok(())
}

/// Resolved 1-based bounds of an `A1` or `A1:B3` style reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RangeBounds {
    min_col: u32,
    min_row: u32,
    max_col: u32,
    max_row: u32,
}

impl RangeBounds {
    fn parse(cell_ref: &str) -> Result<Self> {
        let (start, end) = match cell_ref.split_once(':') {
            Some((start, end)) => (parse_cell_ref(start)?, parse_cell_ref(end)?),
            None => {
                let coord = parse_cell_ref(cell_ref)?;
                (coord, coord)
            }
        };
        Ok(Self {
            min_col: start.0.min(end.0),
            min_row: start.1.min(end.1),
            max_col: start.0.max(end.0),
            max_row: start.1.max(end.1),
        })
    }

    fn is_single_cell(&self) -> bool {
        self.min_col == self.max_col && self.min_row == self.max_row
    }
}

/// Parse a cell reference like "A1" (or "$A$1") into (col, row), 1-based.
fn parse_cell_ref(cell_ref: &str) -> Result<(u32, u32)> {
    let invalid = || SessionError::InvalidCellRef(cell_ref.to_string());
    let s = cell_ref.trim();

    let mut col: u32 = 0;
    let mut i = 0;
    let chars: Vec<char> = s.chars().collect();

    if i < chars.len() && chars[i] == '$' {
        i += 1;
    }
    let letters_start = i;
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        let digit = chars[i].to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(invalid)?;
        i += 1;
    }
    if i == letters_start {
        return Err(invalid());
    }

    if i < chars.len() && chars[i] == '$' {
        i += 1;
    }
    let row_str: String = chars[i..].iter().collect();
    let row: u32 = row_str.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_naming_prefixes_the_whole_path() {
        assert_eq!(
            backup_path_for("/data/report.xlsx", 1_700_000_000),
            "1700000000_/data/report.xlsx"
        );
        assert_eq!(
            backup_path_for("report.xlsx", 1_700_000_000),
            "1700000000_report.xlsx"
        );
    }

    #[test]
    fn verify_path_requires_exact_xlsx_suffix() {
        assert!(verify_path("book.xlsx").is_ok());
        for bad in ["book.xls", "book", "book.xlsx.bak", "book.XLSX"] {
            assert!(
                matches!(verify_path(bad), Err(SessionError::InvalidPath(p)) if p == bad),
                "expected InvalidPath for {bad:?}"
            );
        }
    }

    #[test]
    fn parses_single_cell_refs() {
        assert_eq!(RangeBounds::parse("A1").unwrap(), bounds(1, 1, 1, 1));
        assert_eq!(RangeBounds::parse("Z9").unwrap(), bounds(26, 9, 26, 9));
        assert_eq!(RangeBounds::parse("AA10").unwrap(), bounds(27, 10, 27, 10));
        assert_eq!(RangeBounds::parse("$B$2").unwrap(), bounds(2, 2, 2, 2));
    }

    #[test]
    fn parses_and_normalizes_ranges() {
        assert_eq!(RangeBounds::parse("A1:B3").unwrap(), bounds(1, 1, 2, 3));
        // Reversed endpoints normalize to the same bounds.
        assert_eq!(RangeBounds::parse("B3:A1").unwrap(), bounds(1, 1, 2, 3));
        assert!(RangeBounds::parse("A1:A1").unwrap().is_single_cell());
        assert!(!RangeBounds::parse("A1:A2").unwrap().is_single_cell());
    }

    #[test]
    fn rejects_malformed_refs() {
        for bad in ["", "1A", "A0", "A", "12", "A1:B", ":A1", "A-1"] {
            assert!(
                matches!(
                    RangeBounds::parse(bad),
                    Err(SessionError::InvalidCellRef(_))
                ),
                "expected InvalidCellRef for {bad:?}"
            );
        }
    }

    fn bounds(min_col: u32, min_row: u32, max_col: u32, max_row: u32) -> RangeBounds {
        RangeBounds {
            min_col,
            min_row,
            max_col,
            max_row,
        }
    }
}
