//! # xlsx-session
//!
//! Scoped sessions over `.xlsx` workbooks: open a file, read and write cell
//! ranges, and roll the file back to a backup captured when the session
//! started. All workbook parsing and serialization is delegated to
//! [`umya_spreadsheet`]; this crate owns only the session lifecycle and the
//! backup/restore contract.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xlsx_session::WorkbookSession;
//!
//! # fn example() -> xlsx_session::Result<()> {
//! // Opening writes a timestamped backup next to the file.
//! let mut session = WorkbookSession::open("report.xlsx")?;
//!
//! session.set_cell("Sheet1", "A1", 42.0)?;
//! assert_eq!(session.read_cell("Sheet1", "A1")?.as_number(), Some(42.0));
//!
//! // Rewind the file to its session-start content.
//! session.restore()?;
//!
//! // Saves the workbook and surfaces any save error; dropping the session
//! // without calling close() saves too.
//! session.close()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod session;
pub mod value;

pub use error::{Result, SessionError};
pub use session::{CellRange, WorkbookSession};
pub use value::CellValue;
