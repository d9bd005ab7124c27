// ==========================================
// Emerald Inventory - 工作簿转换 Trait
// ==========================================
// 职责: 定义转换管道各阶段接口（不包含实现）
// 管道: 读取 → 规范化 → 批次登记 ⇄ 记录提取 → 完整性校验 → 序列化
// ==========================================

use crate::domain::lot::{Lot, LotId, ProcessDate, ProcessingRecord};
use crate::domain::report::{ConversionOutcome, IntegrityReport};
use crate::domain::types::CellValue;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 一张工作表的原始行（含表头）
pub type SheetRows = Vec<Vec<CellValue>>;

// ==========================================
// WorkbookConverter Trait
// ==========================================
// 用途: 转换主接口
// 实现者: WorkbookConverterImpl
#[async_trait]
pub trait WorkbookConverter: Send + Sync {
    /// 转换单个工作簿文件
    ///
    /// # 返回
    /// - ConversionOutcome: 是否成功与诊断列表相互独立;
    ///   打不开工作簿属于运行级致命错误,同样体现在诊断中
    async fn convert_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ConversionOutcome;

    /// 批量转换多个工作簿（并发执行）
    ///
    /// # 说明
    /// - 每个文件是一次独立运行,各自拥有批次登记表
    /// - 某个文件失败不影响其他文件
    async fn batch_convert(&self, file_paths: Vec<PathBuf>) -> Vec<ConversionOutcome>;
}

// ==========================================
// WorkbookSource Trait
// ==========================================
// 用途: 工作簿读取接口（整本读入内存后处理）
// 实现者: ExcelWorkbook, InMemoryWorkbook
pub trait WorkbookSource: Send {
    /// 工作簿内全部工作表名称
    fn sheet_names(&self) -> Vec<String>;

    /// 读取一张工作表的全部行（含表头）
    ///
    /// # 返回
    /// - Err: 工作表不存在或内容无法读取（表级结构错误）
    fn read_sheet(&mut self, sheet_name: &str) -> ImportResult<SheetRows>;
}

// ==========================================
// FieldNormalizer Trait
// ==========================================
// 用途: 单元格 → 领域值（全部为全函数,不报错）
// 实现者: FieldNormalizerImpl
pub trait FieldNormalizer: Send + Sync {
    /// 日期规范化,失败返回 None（下游跳过该行）
    fn normalize_date(&self, cell: &CellValue) -> Option<ProcessDate>;

    /// 批次号规范化,空白返回 None
    fn normalize_lot_number(&self, cell: &CellValue) -> Option<String>;

    /// 小数规范化（4 位小数）,空白/无法解析返回 default
    fn normalize_decimal(&self, cell: &CellValue, default: f64) -> f64;

    /// 整数规范化（先转浮点再截断）,空白/无法解析返回 default
    fn normalize_integer(&self, cell: &CellValue, default: Option<i64>) -> Option<i64>;
}

// ==========================================
// LotResolver Trait
// ==========================================
// 用途: 记录提取阶段按批次号取得 lot_id
// 实现者: LotRegistry（发现阶段: 创建/更新）, LotLookup（提取阶段: 只读）
pub trait LotResolver {
    /// 返回批次号对应的 lot_id;只读实现在批次不存在时返回 None
    fn resolve(&mut self, lot_number: &str, lot_weight: f64) -> Option<LotId>;
}

// ==========================================
// IntegrityValidator Trait
// ==========================================
// 用途: 序列化前的引用完整性校验（不修改输入）
// 实现者: IntegrityValidatorImpl
pub trait IntegrityValidator: Send + Sync {
    fn validate(&self, lots: &[Lot], records: &[ProcessingRecord]) -> IntegrityReport;
}
