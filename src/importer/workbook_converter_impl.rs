// ==========================================
// Emerald Inventory - 工作簿转换器实现
// ==========================================
// 职责: 整合转换流程,从工作簿到一致的批次/记录输出对
// 流程: 读取工作表 → 批次发现 → 记录提取 → 完整性校验 → 汇总
// 约定: 单次运行单线程同步执行;批量转换时每个文件独立运行
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::lot::ProcessingRecord;
use crate::domain::report::{
    ConversionOutcome, ConversionOutput, ConversionSummary, Diagnostic, DiagnosticLevel,
    IntegrityIssue, SheetStatus, SheetSummary,
};
use crate::importer::converter_trait::{
    FieldNormalizer, IntegrityValidator, SheetRows, WorkbookConverter, WorkbookSource,
};
use crate::importer::field_normalizer::FieldNormalizer as FieldNormalizerImpl;
use crate::importer::integrity_validator::IntegrityValidator as IntegrityValidatorImpl;
use crate::importer::lot_registry::LotRegistry;
use crate::importer::record_extractor::RecordExtractor;
use crate::importer::workbook_reader::ExcelWorkbook;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 每张映射工作表在流程中的状态
enum SheetSlot {
    Loaded(RecordExtractor, SheetRows),
    Done(SheetSummary),
}

// ==========================================
// WorkbookConverterImpl - 工作簿转换器实现
// ==========================================
pub struct WorkbookConverterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器
    config: Arc<C>,

    // 转换组件
    normalizer: Arc<dyn FieldNormalizer>,
    validator: Arc<dyn IntegrityValidator>,
}

impl<C> Clone for WorkbookConverterImpl<C>
where
    C: ImportConfigReader,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            normalizer: Arc::clone(&self.normalizer),
            validator: Arc::clone(&self.validator),
        }
    }
}

impl<C> WorkbookConverterImpl<C>
where
    C: ImportConfigReader,
{
    /// 使用默认组件创建转换器
    pub fn new(config: C) -> Self {
        let normalizer = FieldNormalizerImpl::new(config.uppercase_lot_numbers());
        Self::with_components(
            config,
            Arc::new(normalizer),
            Arc::new(IntegrityValidatorImpl::new()),
        )
    }

    /// 创建转换器并注入组件
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - normalizer: 字段规范化器
    /// - validator: 完整性校验器
    pub fn with_components(
        config: C,
        normalizer: Arc<dyn FieldNormalizer>,
        validator: Arc<dyn IntegrityValidator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            normalizer,
            validator,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 打开并转换单个工作簿文件（同步）
    ///
    /// # 返回
    /// - 工作簿无法打开时: 运行级致命诊断,无输出
    pub fn convert_path(&self, file_path: &Path) -> ConversionOutcome {
        let source_name = file_path.display().to_string();
        match ExcelWorkbook::open(file_path) {
            Ok(mut workbook) => self.convert_source(&mut workbook, Some(source_name)),
            Err(e) => {
                error!(file = %source_name, error = %e, "工作簿无法打开");
                ConversionOutcome {
                    summary: ConversionSummary {
                        run_id: Uuid::new_v4().to_string(),
                        source: Some(source_name),
                        ..Default::default()
                    },
                    diagnostics: vec![Diagnostic::new(
                        DiagnosticLevel::Fatal,
                        format!("工作簿无法打开: {}", e),
                    )],
                    output: None,
                }
            }
        }
    }

    /// 转换一个已打开的工作簿
    #[instrument(skip(self, source), fields(run_id))]
    pub fn convert_source(
        &self,
        source: &mut dyn WorkbookSource,
        source_name: Option<String>,
    ) -> ConversionOutcome {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let sheets_found = source.sheet_names();
        info!(
            source = source_name.as_deref().unwrap_or("<memory>"),
            sheets = sheets_found.len(),
            "开始转换工作簿"
        );

        let mut diagnostics = Vec::new();

        // === 步骤 1: 读取工作表 ===
        debug!("步骤 1: 读取工作表");
        let header_rows = self.config.header_rows();
        let mut slots = Vec::new();
        for mapping in self.config.sheet_mappings() {
            let stage = mapping.stage;
            let sheet_name = mapping.sheet_name;

            if !sheets_found.iter().any(|name| name == &sheet_name) {
                warn!(sheet = %sheet_name, "工作表缺失,跳过");
                diagnostics.push(
                    Diagnostic::new(DiagnosticLevel::Warning, "工作表不存在,已跳过")
                        .with_stage(stage, &sheet_name),
                );
                slots.push(SheetSlot::Done(SheetSummary::new(
                    sheet_name,
                    stage,
                    SheetStatus::Missing,
                )));
                continue;
            }

            match source.read_sheet(&sheet_name) {
                Ok(rows) => {
                    debug!(sheet = %sheet_name, rows = rows.len(), "工作表读取完成");
                    let extractor = RecordExtractor::new(
                        stage,
                        &sheet_name,
                        self.config.stage_has_given_side(stage),
                        header_rows,
                    );
                    slots.push(SheetSlot::Loaded(extractor, rows));
                }
                Err(e) => {
                    error!(sheet = %sheet_name, error = %e, "工作表读取失败");
                    diagnostics.push(
                        Diagnostic::new(DiagnosticLevel::SheetFailure, e.to_string())
                            .with_stage(stage, &sheet_name),
                    );
                    slots.push(SheetSlot::Done(SheetSummary::new(
                        sheet_name,
                        stage,
                        SheetStatus::Failed,
                    )));
                }
            }
        }

        // === 步骤 2: 批次发现 ===
        debug!("步骤 2: 批次发现");
        let mut registry = LotRegistry::new();
        for slot in &slots {
            if let SheetSlot::Loaded(extractor, rows) = slot {
                extractor.discover_lots(rows, self.normalizer.as_ref(), &mut registry);
            }
        }
        info!(
            lots = registry.len(),
            weight_updates = registry.weight_updates(),
            "批次发现完成"
        );

        // === 步骤 3: 记录提取（批次只读） ===
        debug!("步骤 3: 记录提取");
        let mut records: Vec<ProcessingRecord> = Vec::new();
        let mut sheets = Vec::with_capacity(slots.len());
        {
            let mut lookup = registry.lookup();
            for slot in slots {
                match slot {
                    SheetSlot::Loaded(extractor, rows) => {
                        let extraction =
                            extractor.extract(&rows, self.normalizer.as_ref(), &mut lookup);
                        records.extend(extraction.records);
                        diagnostics.extend(extraction.diagnostics);
                        sheets.push(extraction.summary);
                    }
                    SheetSlot::Done(summary) => sheets.push(summary),
                }
            }
        }
        info!(records = records.len(), "记录提取完成");

        let weight_updates = registry.weight_updates();
        let lots = registry.into_lots();

        // === 步骤 4: 完整性校验 ===
        debug!("步骤 4: 完整性校验");
        let report = self.validator.validate(&lots, &records);
        for issue in &report.issues {
            let level = if issue.is_fatal() {
                DiagnosticLevel::Fatal
            } else {
                DiagnosticLevel::Info
            };
            let mut diagnostic = Diagnostic::new(level, issue.to_string());
            if let Some(lot_number) = issue_lot_number(issue) {
                diagnostic = diagnostic.with_lot(lot_number);
            }
            diagnostics.push(diagnostic);
        }

        // === 步骤 5: 汇总 ===
        let soft_errors = sheets.iter().map(|s| s.soft_errors).sum();
        let summary = ConversionSummary {
            run_id,
            source: source_name,
            sheets_found,
            sheets,
            unique_lots: lots.len(),
            weight_updates,
            total_records: records.len(),
            soft_errors,
            unused_lots: report.unused_lots().count(),
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        let fatal = diagnostics.iter().any(Diagnostic::is_fatal);
        let output = if fatal {
            error!(
                fatal = diagnostics.iter().filter(|d| d.is_fatal()).count(),
                "转换失败,不产出任何文件"
            );
            None
        } else {
            Some(ConversionOutput {
                processed_stages: summary.processed_stages(),
                lots,
                records,
            })
        };

        info!(
            lots = summary.unique_lots,
            records = summary.total_records,
            soft_errors = summary.soft_errors,
            unused_lots = summary.unused_lots,
            elapsed_ms = summary.elapsed_ms as u64,
            success = !fatal,
            "工作簿转换完成"
        );

        ConversionOutcome {
            summary,
            diagnostics,
            output,
        }
    }
}

fn issue_lot_number(issue: &IntegrityIssue) -> Option<&str> {
    match issue {
        IntegrityIssue::OrphanedReference { lot_number, .. }
        | IntegrityIssue::DuplicateLotNumber { lot_number }
        | IntegrityIssue::UnusedLot { lot_number, .. } => Some(lot_number.as_str()),
        IntegrityIssue::LotNumberMismatch { expected, .. } => Some(expected.as_str()),
        IntegrityIssue::DuplicateRecordId { .. } => None,
    }
}

#[async_trait::async_trait]
impl<C> WorkbookConverter for WorkbookConverterImpl<C>
where
    C: ImportConfigReader + 'static,
{
    /// 转换单个工作簿文件
    ///
    /// 解析是 CPU 密集的同步工作,放到阻塞线程池执行
    async fn convert_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ConversionOutcome {
        let path = file_path.as_ref().to_path_buf();
        let converter = self.clone();
        let source_name = path.display().to_string();

        match tokio::task::spawn_blocking(move || converter.convert_path(&path)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(file = %source_name, error = %e, "转换任务异常终止");
                ConversionOutcome {
                    summary: ConversionSummary {
                        run_id: Uuid::new_v4().to_string(),
                        source: Some(source_name),
                        ..Default::default()
                    },
                    diagnostics: vec![Diagnostic::new(
                        DiagnosticLevel::Fatal,
                        format!("转换任务异常终止: {}", e),
                    )],
                    output: None,
                }
            }
        }
    }

    /// 批量转换多个工作簿（并发执行）
    async fn batch_convert(&self, file_paths: Vec<PathBuf>) -> Vec<ConversionOutcome> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量转换工作簿");

        let tasks = file_paths.into_iter().map(|path| async move {
            let outcome = self.convert_file(&path).await;
            if outcome.succeeded() {
                info!(file = %path.display(), records = outcome.summary.total_records, "文件转换成功");
            } else {
                warn!(file = %path.display(), "文件转换失败");
            }
            outcome
        });

        let outcomes = join_all(tasks).await;

        info!(
            total = outcomes.len(),
            success = outcomes.iter().filter(|o| o.succeeded()).count(),
            failed = outcomes.iter().filter(|o| !o.succeeded()).count(),
            "批量转换完成"
        );

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::domain::types::{CellValue, Stage};
    use crate::importer::workbook_reader::InMemoryWorkbook;

    fn header() -> Vec<CellValue> {
        vec![CellValue::text("DATE"), CellValue::text("LOT NO.")]
    }

    fn data(date: &str, lot: &str, weight: f64) -> Vec<CellValue> {
        vec![
            CellValue::text(date),
            CellValue::text(lot),
            CellValue::Number(weight),
        ]
    }

    fn converter() -> WorkbookConverterImpl<ConfigManager> {
        WorkbookConverterImpl::new(ConfigManager::new())
    }

    #[test]
    fn test_missing_sheets_are_warnings() {
        let mut workbook = InMemoryWorkbook::new()
            .with_sheet("GHAT SHEET", vec![header(), data("14-06-2025", "L-1", 1.0)]);

        let outcome = converter().convert_source(&mut workbook, None);
        assert!(outcome.succeeded());
        assert_eq!(outcome.count_level(DiagnosticLevel::Warning), 3);
        assert_eq!(outcome.summary.processed_stages(), vec![Stage::Ghat]);
        assert_eq!(outcome.summary.sheets.len(), 4);
        assert_eq!(outcome.summary.sheets[0].status, SheetStatus::Missing);
    }

    #[test]
    fn test_unreadable_sheet_does_not_affect_siblings() {
        let mut workbook = InMemoryWorkbook::new()
            .with_unreadable_sheet("CUT SHEET", "corrupt")
            .with_sheet("MM SHEET", vec![header(), data("14-06-2025", "L-1", 1.0)]);

        let outcome = converter().convert_source(&mut workbook, None);
        assert!(outcome.succeeded());
        assert_eq!(outcome.count_level(DiagnosticLevel::SheetFailure), 1);
        assert_eq!(outcome.summary.sheets[0].status, SheetStatus::Failed);
        let output = outcome.output.unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.processed_stages, vec![Stage::Mm]);
    }

    #[test]
    fn test_lot_seen_only_on_bad_row_is_unused_info() {
        let mut workbook = InMemoryWorkbook::new().with_sheet(
            "GHAT SHEET",
            vec![
                header(),
                data("14-06-2025", "L-1", 1.0),
                data("not a date", "L-2", 2.0),
            ],
        );

        let outcome = converter().convert_source(&mut workbook, None);
        assert!(outcome.succeeded());
        assert_eq!(outcome.summary.unique_lots, 2);
        assert_eq!(outcome.summary.unused_lots, 1);
        assert_eq!(outcome.summary.soft_errors, 1);
        assert_eq!(outcome.count_level(DiagnosticLevel::Info), 1);
    }

    #[test]
    fn test_unopenable_file_is_fatal() {
        let outcome = converter().convert_path(Path::new("does_not_exist.xlsx"));
        assert!(!outcome.succeeded());
        assert!(outcome.output.is_none());
        assert_eq!(outcome.count_level(DiagnosticLevel::Fatal), 1);
    }

    #[test]
    fn test_records_follow_sheet_order() {
        let mut workbook = InMemoryWorkbook::new()
            .with_sheet("POLISH SHEET", vec![header(), data("01-01-2025", "L-1", 1.0)])
            .with_sheet("CUT SHEET", vec![header(), data("02-01-2025", "L-1", 1.0)]);

        let outcome = converter().convert_source(&mut workbook, None);
        let output = outcome.output.unwrap();
        let stages: Vec<Stage> = output.records.iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec![Stage::Cut, Stage::Polish]);
    }
}
