// ==========================================
// Emerald Inventory - 核心库
// ==========================================
// 职责: 加工工作簿（CUT/GHAT/MM/POLISH 四张工序表）→ 规范化 CSV
// 产出: lots.csv / processing_records.csv / 分工序文件 / 运行报告
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 批次/记录/诊断
pub mod domain;

// 导入层 - 工作簿读取与转换管道
pub mod importer;

// 导出层 - CSV 与运行报告
pub mod export;

// 配置层 - 转换配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellValue, LotStatus, Stage};

// 领域实体
pub use domain::{
    ConversionOutcome, ConversionOutput, ConversionSummary, Diagnostic, DiagnosticLevel,
    IntegrityReport, Lot, LotId, ProcessDate, ProcessingRecord, RecordId,
};

// 转换管道
pub use importer::{
    ExcelWorkbook, ImportError, ImportResult, InMemoryWorkbook, LotRegistry, WorkbookConverter,
    WorkbookConverterImpl,
};

// 导出
pub use export::{ConversionReport, CsvArtifactSet};

// 配置
pub use config::{ConfigManager, ConversionConfig, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Emerald Inventory";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
