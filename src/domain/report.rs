// ==========================================
// Emerald Inventory - 转换诊断与运行报告
// ==========================================
// 职责: 诊断分级 / 工作表汇总 / 完整性报告 / 运行结果
// 约定: "是否成功" 与 "累积了哪些问题" 是两个独立的信息
// ==========================================

use crate::domain::lot::{Lot, LotId, ProcessingRecord, RecordId};
use crate::domain::types::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// DiagnosticLevel - 诊断级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticLevel {
    Info,         // 提示（如未被引用的批次）
    Warning,      // 警告（如工作表缺失）
    SoftError,    // 行级软错误,继续处理
    SheetFailure, // 工作表级结构错误,该表无产出
    Fatal,        // 运行级致命错误,不产出任何文件
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "INFO"),
            DiagnosticLevel::Warning => write!(f, "WARNING"),
            DiagnosticLevel::SoftError => write!(f, "SOFT_ERROR"),
            DiagnosticLevel::SheetFailure => write!(f, "SHEET_FAILURE"),
            DiagnosticLevel::Fatal => write!(f, "FATAL"),
        }
    }
}

// ==========================================
// Diagnostic - 诊断条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub stage: Option<Stage>,        // 所属工序（运行级诊断为空）
    pub sheet: Option<String>,       // 工作表名称
    pub row_number: Option<usize>,   // 工作表行号（含表头,从 1 开始）
    pub lot_number: Option<String>,  // 相关批次号
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            stage: None,
            sheet: None,
            row_number: None,
            lot_number: None,
            message: message.into(),
        }
    }

    pub fn with_stage(mut self, stage: Stage, sheet: impl Into<String>) -> Self {
        self.stage = Some(stage);
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_row(mut self, row_number: usize) -> Self {
        self.row_number = Some(row_number);
        self
    }

    pub fn with_lot(mut self, lot_number: impl Into<String>) -> Self {
        self.lot_number = Some(lot_number.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.level == DiagnosticLevel::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.level)?;
        if let Some(stage) = self.stage {
            write!(f, " {}", stage)?;
        }
        if let Some(row) = self.row_number {
            write!(f, " 行 {}", row)?;
        }
        if let Some(lot) = &self.lot_number {
            write!(f, " 批次 {}", lot)?;
        }
        write!(f, ": {}", self.message)
    }
}

// ==========================================
// SheetSummary - 单表处理汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetStatus {
    Processed, // 已处理
    Missing,   // 工作簿中不存在
    Failed,    // 读取失败
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub sheet_name: String,
    pub stage: Stage,
    pub status: SheetStatus,
    pub rows_read: usize,       // 数据行数（不含表头）
    pub records_emitted: usize, // 产出记录数
    pub rows_skipped: usize,    // 静默跳过行数
    pub soft_errors: usize,     // 软错误行数
}

impl SheetSummary {
    pub fn new(sheet_name: impl Into<String>, stage: Stage, status: SheetStatus) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            stage,
            status,
            rows_read: 0,
            records_emitted: 0,
            rows_skipped: 0,
            soft_errors: 0,
        }
    }
}

// ==========================================
// IntegrityReport - 引用完整性校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityIssue {
    /// 记录引用的 lot_id 不在批次集合中（致命）
    OrphanedReference { record_id: RecordId, lot_id: LotId, lot_number: String },
    /// 记录冗余的批次号与所引用批次不一致（致命）
    LotNumberMismatch { record_id: RecordId, lot_id: LotId, expected: String, found: String },
    /// 批次号重复（致命）
    DuplicateLotNumber { lot_number: String },
    /// record_id 重复（致命）
    DuplicateRecordId { record_id: RecordId },
    /// 批次未被任何记录引用（提示）
    UnusedLot { lot_id: LotId, lot_number: String },
}

impl IntegrityIssue {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IntegrityIssue::UnusedLot { .. })
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::OrphanedReference { record_id, lot_id, lot_number } => write!(
                f,
                "记录 {} 引用了不存在的批次 {} (批次号 {})",
                record_id, lot_id, lot_number
            ),
            IntegrityIssue::LotNumberMismatch { record_id, lot_id, expected, found } => write!(
                f,
                "记录 {} 的批次号 {} 与批次 {} 的批次号 {} 不一致",
                record_id, found, lot_id, expected
            ),
            IntegrityIssue::DuplicateLotNumber { lot_number } => {
                write!(f, "批次号重复: {}", lot_number)
            }
            IntegrityIssue::DuplicateRecordId { record_id } => {
                write!(f, "record_id 重复: {}", record_id)
            }
            IntegrityIssue::UnusedLot { lot_number, .. } => {
                write!(f, "批次 {} 未被任何加工记录引用", lot_number)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    /// 无致命问题即通过（未引用批次不阻断输出）
    pub fn passed(&self) -> bool {
        !self.issues.iter().any(IntegrityIssue::is_fatal)
    }

    pub fn fatal_issues(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.is_fatal())
    }

    pub fn unused_lots(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| !i.is_fatal())
    }
}

// ==========================================
// ConversionSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub run_id: String,                // 运行 ID（UUID）
    pub source: Option<String>,        // 源工作簿
    pub sheets_found: Vec<String>,     // 工作簿中全部工作表
    pub sheets: Vec<SheetSummary>,     // 四道工序工作表的处理情况
    pub unique_lots: usize,            // 去重后批次数
    pub weight_updates: usize,         // 重量被后续出现覆盖的次数
    pub total_records: usize,          // 加工记录数
    pub soft_errors: usize,            // 软错误数
    pub unused_lots: usize,            // 未引用批次数
    pub elapsed_ms: u128,              // 耗时
}

impl ConversionSummary {
    /// 实际处理过的工序（按处理顺序）
    pub fn processed_stages(&self) -> Vec<Stage> {
        self.sheets
            .iter()
            .filter(|s| s.status == SheetStatus::Processed)
            .map(|s| s.stage)
            .collect()
    }
}

// ==========================================
// ConversionOutput - 一致的输出对
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOutput {
    pub lots: Vec<Lot>,                     // 按创建顺序
    pub records: Vec<ProcessingRecord>,     // 按工作表处理顺序
    pub processed_stages: Vec<Stage>,       // 需要导出分工序文件的工序
}

// ==========================================
// ConversionOutcome - 运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub summary: ConversionSummary,
    pub diagnostics: Vec<Diagnostic>,
    /// 致命错误时为 None
    pub output: Option<ConversionOutput>,
}

impl ConversionOutcome {
    /// 运行是否成功（与诊断列表相互独立）
    pub fn succeeded(&self) -> bool {
        self.output.is_some() && !self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count_level(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}
