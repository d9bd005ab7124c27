// ==========================================
// Emerald Inventory - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、诊断报告
// 红线: 不含文件读取逻辑,不含导入流程逻辑
// ==========================================

pub mod lot;
pub mod report;
pub mod types;

// 重导出核心类型
pub use lot::{Lot, LotId, ProcessDate, ProcessingRecord, RecordId};
pub use report::{
    ConversionOutcome, ConversionOutput, ConversionSummary, Diagnostic, DiagnosticLevel,
    IntegrityIssue, IntegrityReport, SheetStatus, SheetSummary,
};
pub use types::{CellValue, LotStatus, Stage};
