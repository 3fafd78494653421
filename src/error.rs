//! Error types for workbook sessions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("workbook path must end in .xlsx: {0}")]
    InvalidPath(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("invalid cell reference: {0}")]
    InvalidCellRef(String),

    #[error("workbook I/O failed: {0}")]
    Xlsx(#[from] umya_spreadsheet::XlsxError),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
