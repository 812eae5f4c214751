//! Export, import and backup of the quote collection
//!
//! Handles:
//! - JSON export/import codec
//! - Backup files on local disk

mod backup;
pub mod codec;

pub use backup::{BackupInfo, BackupService};
pub use codec::{
    DEFAULT_FILE_PREFIX, ExportDocument, ImportPreview, ImportReport, export_all, import_document,
    prepare_import,
};
