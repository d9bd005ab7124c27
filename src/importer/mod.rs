// ==========================================
// Emerald Inventory - 导入层
// ==========================================
// 职责: 工作簿 → 批次登记表 + 加工记录
// 支持: Excel（.xlsx/.xlsm/.xlsb/.xls）, OpenDocument（.ods）
// ==========================================

// 模块声明
pub mod converter_trait;
pub mod error;
pub mod field_normalizer;
pub mod integrity_validator;
pub mod lot_registry;
pub mod record_extractor;
pub mod workbook_converter_impl;
pub mod workbook_reader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_normalizer::FieldNormalizer as FieldNormalizerImpl;
pub use integrity_validator::IntegrityValidator as IntegrityValidatorImpl;
pub use lot_registry::{LotLookup, LotRegistry};
pub use record_extractor::{RecordExtractor, SheetExtraction};
pub use workbook_converter_impl::WorkbookConverterImpl;
pub use workbook_reader::{ExcelWorkbook, InMemoryWorkbook};

// 重导出 Trait 接口
pub use converter_trait::{
    FieldNormalizer, IntegrityValidator, LotResolver, SheetRows, WorkbookConverter,
    WorkbookSource,
};
