// ==========================================
// Emerald Inventory - 导出层
// ==========================================
// 职责: CSV 产物与运行报告
// ==========================================

pub mod csv_writer;
pub mod report_writer;

pub use csv_writer::{
    render_lots_csv, render_records_csv, CsvArtifactSet, LOTS_FILE, LOT_COLUMNS, RECORDS_FILE,
    RECORD_COLUMNS,
};
pub use report_writer::{ConversionReport, REPORT_FILE};
