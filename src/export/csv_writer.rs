// ==========================================
// Emerald Inventory - CSV 导出
// ==========================================
// 职责: 把一致的批次/记录输出对渲染为 CSV 文本
// 排序: 批次按批次号升序;记录按 (加工日期, 工序标签) 稳定升序
// 格式: 小数固定 4 位;缺失件数输出为空字段
// ==========================================

use crate::domain::lot::{Lot, ProcessingRecord};
use crate::domain::report::{ConversionOutcome, ConversionOutput};
use crate::importer::error::{ImportError, ImportResult};
use csv::{Terminator, WriterBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const LOTS_FILE: &str = "lots.csv";
pub const RECORDS_FILE: &str = "processing_records.csv";

pub const LOT_COLUMNS: [&str; 4] = ["lot_id", "lot_number", "lot_weight", "status"];

pub const RECORD_COLUMNS: [&str; 9] = [
    "record_id",
    "lot_id",
    "lot_number",
    "stage",
    "process_date",
    "given_pieces",
    "given_weight",
    "received_pieces",
    "received_weight",
];

/// 小数固定 4 位
pub fn format_decimal(value: f64) -> String {
    format!("{:.4}", value)
}

fn format_pieces(pieces: Option<i64>) -> String {
    pieces.map(|p| p.to_string()).unwrap_or_default()
}

/// 批次按批次号字典序升序
pub fn sorted_lots(lots: &[Lot]) -> Vec<&Lot> {
    let mut sorted: Vec<&Lot> = lots.iter().collect();
    sorted.sort_by(|a, b| a.lot_number.cmp(&b.lot_number));
    sorted
}

/// 记录按 (加工日期, 工序标签) 稳定升序
pub fn sorted_records<'a, I>(records: I) -> Vec<&'a ProcessingRecord>
where
    I: IntoIterator<Item = &'a ProcessingRecord>,
{
    let mut sorted: Vec<&ProcessingRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.process_date
            .cmp(&b.process_date)
            .then_with(|| a.stage.label().cmp(b.stage.label()))
    });
    sorted
}

fn render<F>(header: &[&str], rows: F) -> ImportResult<String>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> ImportResult<()>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(header)?;
    rows(&mut writer)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::CsvWriteError(e.to_string()))
}

/// 渲染 lots.csv
pub fn render_lots_csv(lots: &[Lot]) -> ImportResult<String> {
    render(&LOT_COLUMNS, |writer| {
        for lot in sorted_lots(lots) {
            writer.write_record([
                lot.lot_id.to_string(),
                lot.lot_number.clone(),
                format_decimal(lot.lot_weight),
                lot.status.to_string(),
            ])?;
        }
        Ok(())
    })
}

/// 渲染加工记录 CSV（总表与分工序文件共用）
pub fn render_records_csv<'a, I>(records: I) -> ImportResult<String>
where
    I: IntoIterator<Item = &'a ProcessingRecord>,
{
    render(&RECORD_COLUMNS, |writer| {
        for record in sorted_records(records) {
            writer.write_record([
                record.record_id.to_string(),
                record.lot_id.to_string(),
                record.lot_number.clone(),
                record.stage.label().to_string(),
                record.process_date.to_string(),
                format_pieces(record.given_pieces),
                format_decimal(record.given_weight),
                format_pieces(record.received_pieces),
                format_decimal(record.received_weight),
            ])?;
        }
        Ok(())
    })
}

// ==========================================
// CsvArtifactSet - 一次运行的全部 CSV 产物
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvArtifactSet {
    files: BTreeMap<String, String>, // 文件名 → 内容
}

impl CsvArtifactSet {
    /// 由一致的输出对生成全部产物
    pub fn from_output(output: &ConversionOutput) -> ImportResult<Self> {
        let mut files = BTreeMap::new();
        files.insert(LOTS_FILE.to_string(), render_lots_csv(&output.lots)?);
        files.insert(
            RECORDS_FILE.to_string(),
            render_records_csv(&output.records)?,
        );

        // 每张处理过的工作表一个分工序文件（无记录时只有表头）
        for stage in &output.processed_stages {
            let content =
                render_records_csv(output.records.iter().filter(|r| r.stage == *stage))?;
            files.insert(stage.records_file_name(), content);
        }

        debug!(files = files.len(), "CSV 产物已生成");
        Ok(Self { files })
    }

    /// 仅成功的运行产出 CSV
    pub fn from_outcome(outcome: &ConversionOutcome) -> ImportResult<Self> {
        match &outcome.output {
            Some(output) if outcome.succeeded() => Self::from_output(output),
            _ => Err(ImportError::RunFailed {
                fatal: outcome.diagnostics.iter().filter(|d| d.is_fatal()).count(),
            }),
        }
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 写出到目录（不存在则创建）
    ///
    /// # 返回
    /// - 已写出的文件路径（按文件名排序）
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> ImportResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.files.len());
        for (name, content) in &self.files {
            let path = dir.join(name);
            fs::write(&path, content)?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "CSV 文件写出完成");
        Ok(written)
    }
}
