// ==========================================
// Emerald Inventory - 加工记录提取器
// ==========================================
// 职责: 按固定列位逐行提取,产出工序加工记录
// 列位: 0 日期 / 1 批次号 / 2 批次重量 / 3 发出件数 / 4 发出重量 /
//       5 收回件数 / 6 收回重量
// 约定: 单行问题只降级为 "跳过" 或 "软错误",不中断整张表
// ==========================================

use crate::domain::lot::{ProcessDate, ProcessingRecord};
use crate::domain::report::{Diagnostic, DiagnosticLevel, SheetStatus, SheetSummary};
use crate::domain::types::{CellValue, Stage};
use crate::importer::converter_trait::{FieldNormalizer, LotResolver, SheetRows};
use crate::importer::lot_registry::LotRegistry;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod columns {
    pub const DATE: usize = 0;
    pub const LOT_NUMBER: usize = 1;
    pub const LOT_WEIGHT: usize = 2;
    pub const GIVEN_PIECES: usize = 3;
    pub const GIVEN_WEIGHT: usize = 4;
    pub const RECEIVED_PIECES: usize = 5;
    pub const RECEIVED_WEIGHT: usize = 6;
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// 越界列按缺失处理（容忍短行）
fn cell(row: &[CellValue], col: usize) -> &CellValue {
    row.get(col).unwrap_or(&EMPTY_CELL)
}

fn describe(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => "<空>".to_string(),
        CellValue::Text(s) => format!("'{}'", s),
        CellValue::Number(n) => n.to_string(),
        CellValue::Date(dt) => dt.to_string(),
    }
}

// ==========================================
// SheetExtraction - 单表提取结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetExtraction {
    pub records: Vec<ProcessingRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: SheetSummary,
}

// ==========================================
// RecordExtractor - 单张工序表的提取器
// ==========================================
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    stage: Stage,
    sheet_name: String,
    has_given_side: bool, // false 时发出件数/重量一律忽略
    header_rows: usize,
}

impl RecordExtractor {
    pub fn new(
        stage: Stage,
        sheet_name: impl Into<String>,
        has_given_side: bool,
        header_rows: usize,
    ) -> Self {
        Self {
            stage,
            sheet_name: sheet_name.into(),
            has_given_side,
            header_rows,
        }
    }

    /// 数据行（跳过开头的全空行与表头）,附带工作表行号（从 1 开始）
    fn data_rows<'r>(&self, rows: &'r SheetRows) -> impl Iterator<Item = (usize, &'r [CellValue])> {
        let leading_blank = rows
            .iter()
            .take_while(|row| row.iter().all(CellValue::is_blank))
            .count();
        rows.iter()
            .enumerate()
            .skip(leading_blank + self.header_rows)
            .map(|(idx, row)| (idx + 1, row.as_slice()))
    }

    /// 发现阶段: 首列非空且批次号有效的行全部登记（不要求日期有效）
    ///
    /// # 返回
    /// - 本表登记的批次出现次数
    pub fn discover_lots(
        &self,
        rows: &SheetRows,
        normalizer: &dyn FieldNormalizer,
        registry: &mut LotRegistry,
    ) -> usize {
        let mut sightings = 0;
        for (_, row) in self.data_rows(rows) {
            if cell(row, columns::DATE).is_blank() {
                continue;
            }
            let lot_number = normalizer.normalize_lot_number(cell(row, columns::LOT_NUMBER));
            let lot_weight = normalizer.normalize_decimal(cell(row, columns::LOT_WEIGHT), 0.0);
            if let Some(lot_number) = lot_number {
                registry.register(&lot_number, lot_weight);
                sightings += 1;
            }
        }
        debug!(stage = %self.stage, sightings = sightings, "批次发现完成");
        sightings
    }

    /// 提取阶段: 逐行产出加工记录
    pub fn extract(
        &self,
        rows: &SheetRows,
        normalizer: &dyn FieldNormalizer,
        resolver: &mut dyn LotResolver,
    ) -> SheetExtraction {
        let mut summary = SheetSummary::new(&self.sheet_name, self.stage, SheetStatus::Processed);
        let mut records = Vec::new();
        let mut diagnostics = Vec::new();

        for (row_number, row) in self.data_rows(rows) {
            summary.rows_read += 1;

            // 1. 首列空白 = 有意留空的行
            let date_cell = cell(row, columns::DATE);
            if date_cell.is_blank() {
                summary.rows_skipped += 1;
                continue;
            }

            // 2. 必填字段
            let process_date = normalizer.normalize_date(date_cell);
            let lot_number = normalizer.normalize_lot_number(cell(row, columns::LOT_NUMBER));
            let lot_weight = normalizer.normalize_decimal(cell(row, columns::LOT_WEIGHT), 0.0);

            // 3. 必填字段失败: 有其他内容记软错误,否则静默跳过
            let (process_date, lot_number) = match (process_date, lot_number) {
                (Some(date), Some(lot)) => (date, lot),
                (date, lot) => {
                    let has_other_content = row.iter().skip(1).any(|c| !c.is_blank());
                    if has_other_content {
                        let message = required_field_message(
                            date.as_ref(),
                            lot.as_deref(),
                            date_cell,
                        );
                        warn!(
                            stage = %self.stage,
                            row_number = row_number,
                            message = %message,
                            "必填字段规范化失败"
                        );
                        let mut diagnostic = Diagnostic::new(DiagnosticLevel::SoftError, message)
                            .with_stage(self.stage, &self.sheet_name)
                            .with_row(row_number);
                        if let Some(lot) = lot {
                            diagnostic = diagnostic.with_lot(lot);
                        }
                        diagnostics.push(diagnostic);
                        summary.soft_errors += 1;
                    } else {
                        summary.rows_skipped += 1;
                    }
                    continue;
                }
            };

            // 4-5. 发出/收回字段（无发出侧的工序忽略发出列）
            let (given_pieces, given_weight) = if self.has_given_side {
                (
                    normalizer.normalize_integer(cell(row, columns::GIVEN_PIECES), None),
                    normalizer.normalize_decimal(cell(row, columns::GIVEN_WEIGHT), 0.0),
                )
            } else {
                (None, 0.0)
            };
            let received_pieces =
                normalizer.normalize_integer(cell(row, columns::RECEIVED_PIECES), None);
            let received_weight =
                normalizer.normalize_decimal(cell(row, columns::RECEIVED_WEIGHT), 0.0);

            // 6. 批次解析
            let lot_id = match resolver.resolve(&lot_number, lot_weight) {
                Some(id) => id,
                None => {
                    // 发现阶段已登记全部有效批次号,走到这里说明解析逻辑有缺陷
                    diagnostics.push(
                        Diagnostic::new(DiagnosticLevel::Fatal, "批次号未能解析为 lot_id")
                            .with_stage(self.stage, &self.sheet_name)
                            .with_row(row_number)
                            .with_lot(&lot_number),
                    );
                    continue;
                }
            };

            // 7. 产出记录
            records.push(ProcessingRecord {
                record_id: Uuid::new_v4(),
                lot_id,
                lot_number,
                stage: self.stage,
                process_date,
                given_pieces,
                given_weight,
                received_pieces,
                received_weight,
            });
            summary.records_emitted += 1;
        }

        debug!(
            stage = %self.stage,
            rows = summary.rows_read,
            records = summary.records_emitted,
            skipped = summary.rows_skipped,
            soft_errors = summary.soft_errors,
            "工作表提取完成"
        );

        SheetExtraction {
            records,
            diagnostics,
            summary,
        }
    }
}

fn required_field_message(
    date: Option<&ProcessDate>,
    lot: Option<&str>,
    date_cell: &CellValue,
) -> String {
    match (date, lot) {
        (None, None) => format!("日期无法解析 ({}) 且批次号缺失", describe(date_cell)),
        (None, Some(_)) => format!("日期无法解析: {}", describe(date_cell)),
        (Some(_), None) => "批次号缺失".to_string(),
        (Some(_), Some(_)) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_normalizer::FieldNormalizer as Normalizer;

    fn header() -> Vec<CellValue> {
        [
            "DATE", "LOT NO.", "LOT WEIGHT", "GIVEN P.", "GIVEN W.", "REC.P", "REC.W",
        ]
        .iter()
        .map(|h| CellValue::text(*h))
        .collect()
    }

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::text(*c)
                }
            })
            .collect()
    }

    fn run(stage: Stage, has_given_side: bool, rows: SheetRows) -> (LotRegistry, SheetExtraction) {
        let normalizer = Normalizer::default();
        let extractor = RecordExtractor::new(stage, "TEST SHEET", has_given_side, 1);
        let mut registry = LotRegistry::new();
        extractor.discover_lots(&rows, &normalizer, &mut registry);
        let extraction = extractor.extract(&rows, &normalizer, &mut registry.lookup());
        (registry, extraction)
    }

    #[test]
    fn test_valid_row_produces_record() {
        let rows = vec![
            header(),
            row(&["14-06-2025", "L-1", "10.5", "20", "9.75", "18", "9.5"]),
        ];
        let (registry, extraction) = run(Stage::Ghat, true, rows);

        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.stage, Stage::Ghat);
        assert_eq!(record.process_date.as_str(), "2025-06-14");
        assert_eq!(record.lot_number, "L-1");
        assert_eq!(record.lot_id, registry.get("L-1").unwrap().lot_id);
        assert_eq!(record.given_pieces, Some(20));
        assert_eq!(record.given_weight, 9.75);
        assert_eq!(record.received_pieces, Some(18));
        assert_eq!(record.received_weight, 9.5);
        assert_eq!(extraction.summary.records_emitted, 1);
    }

    #[test]
    fn test_stage_without_given_side_ignores_given_columns() {
        let rows = vec![
            header(),
            row(&["14-06-2025", "L-1", "10", "25", "3.5", "24", "9.8"]),
        ];
        let (_, extraction) = run(Stage::Cut, false, rows);

        let record = &extraction.records[0];
        assert_eq!(record.given_pieces, None);
        assert_eq!(record.given_weight, 0.0);
        assert_eq!(record.received_pieces, Some(24));
    }

    #[test]
    fn test_blank_first_cell_is_skipped_silently() {
        let rows = vec![header(), row(&["", "L-1", "10", "", "", "", ""])];
        let (registry, extraction) = run(Stage::Mm, true, rows);

        assert!(extraction.records.is_empty());
        assert!(extraction.diagnostics.is_empty());
        assert_eq!(extraction.summary.rows_skipped, 1);
        // 发现阶段同样跳过
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_date_with_content_is_soft_error() {
        let rows = vec![header(), row(&["someday", "L-1", "10", "", "", "", ""])];
        let (registry, extraction) = run(Stage::Polish, true, rows);

        assert!(extraction.records.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        let diagnostic = &extraction.diagnostics[0];
        assert_eq!(diagnostic.level, DiagnosticLevel::SoftError);
        assert_eq!(diagnostic.row_number, Some(2));
        assert_eq!(diagnostic.stage, Some(Stage::Polish));
        assert_eq!(diagnostic.lot_number.as_deref(), Some("L-1"));
        // 批次仍在发现阶段登记（未被引用的批次由完整性校验报告）
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bad_date_without_other_content_is_skipped() {
        let rows = vec![header(), row(&["TOTAL"])];
        let (_, extraction) = run(Stage::Cut, false, rows);

        assert!(extraction.records.is_empty());
        assert!(extraction.diagnostics.is_empty());
        assert_eq!(extraction.summary.rows_skipped, 1);
    }

    #[test]
    fn test_short_row_uses_defaults() {
        let rows = vec![header(), row(&["2025-06-14", "L-1", "10"])];
        let (_, extraction) = run(Stage::Ghat, true, rows);

        let record = &extraction.records[0];
        assert_eq!(record.given_pieces, None);
        assert_eq!(record.given_weight, 0.0);
        assert_eq!(record.received_pieces, None);
        assert_eq!(record.received_weight, 0.0);
    }

    #[test]
    fn test_row_numbers_follow_sheet_rows() {
        let rows = vec![
            header(),
            row(&["14-06-2025", "L-1", "1"]),
            row(&["", "", ""]),
            row(&["bad", "L-2", "1"]),
        ];
        let (_, extraction) = run(Stage::Ghat, true, rows);
        assert_eq!(extraction.diagnostics[0].row_number, Some(4));
        assert_eq!(extraction.summary.rows_read, 3);
    }

    #[test]
    fn test_header_below_leading_blank_rows() {
        let rows = vec![
            vec![],
            vec![CellValue::Empty, CellValue::Empty],
            header(),
            row(&["14-06-2025", "L-1", "1"]),
            row(&["bad", "L-2", "1"]),
        ];
        let (registry, extraction) = run(Stage::Ghat, true, rows);

        // 表头不会被当成数据行
        assert!(registry.get("LOT NO.").is_none());
        assert_eq!(registry.len(), 2);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.summary.rows_read, 2);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].row_number, Some(5));
    }

    #[test]
    fn test_unresolved_lot_is_fatal() {
        let normalizer = Normalizer::default();
        let extractor = RecordExtractor::new(Stage::Ghat, "GHAT SHEET", true, 1);
        let rows = vec![header(), row(&["14-06-2025", "L-1", "1"])];
        // 未执行发现阶段
        let registry = LotRegistry::new();
        let extraction = extractor.extract(&rows, &normalizer, &mut registry.lookup());

        assert!(extraction.records.is_empty());
        assert!(extraction.diagnostics[0].is_fatal());
    }

    #[test]
    fn test_record_ids_are_unique() {
        let rows = vec![
            header(),
            row(&["14-06-2025", "L-1", "1"]),
            row(&["15-06-2025", "L-1", "1"]),
        ];
        let (_, extraction) = run(Stage::Mm, true, rows);
        assert_eq!(extraction.records.len(), 2);
        assert_ne!(extraction.records[0].record_id, extraction.records[1].record_id);
        assert_eq!(extraction.records[0].lot_id, extraction.records[1].lot_id);
    }
}
