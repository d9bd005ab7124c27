// ==========================================
// Emerald Inventory - 工作簿读取器实现
// ==========================================
// 职责: 阶段 0 文件读取,把单元格统一转换为 CellValue
// 支持: .xlsx / .xlsm / .xlsb / .xls / .ods（calamine）
// ==========================================

use crate::domain::types::CellValue;
use crate::importer::converter_trait::{SheetRows, WorkbookSource};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

const SUPPORTED_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

// ==========================================
// ExcelWorkbook - 基于 calamine 的工作簿
// ==========================================
pub struct ExcelWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl ExcelWorkbook {
    /// 打开工作簿（先检查文件存在与扩展名）
    pub fn open<P: AsRef<Path>>(file_path: P) -> ImportResult<Self> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let sheets = open_workbook_auto(path)?;
        debug!(path = %path.display(), "工作簿已打开");
        Ok(Self { sheets })
    }
}

impl WorkbookSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> ImportResult<SheetRows> {
        if !self.sheet_names().iter().any(|n| n == sheet_name) {
            return Err(ImportError::SheetNotFound(sheet_name.to_string()));
        }

        let range = self
            .sheets
            .worksheet_range(sheet_name)
            .map_err(|e| ImportError::SheetReadError {
                sheet: sheet_name.to_string(),
                message: e.to_string(),
            })?;

        Ok(range_to_rows(&range))
    }
}

/// Range 只覆盖有内容的区域,这里补齐到 A1 起始的绝对行列位置,
/// 保证 "第 N 列" 与工作表列号一致。
fn range_to_rows(range: &Range<Data>) -> SheetRows {
    let (row_offset, col_offset) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return Vec::new(),
    };

    let mut rows: SheetRows = vec![Vec::new(); row_offset];
    for data_row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(data_row.iter().map(cell_from_data));
        rows.push(cells);
    }
    rows
}

/// calamine 单元格 → CellValue（唯一的类型判定边界）
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                CellValue::Number(dt.as_f64())
            } else {
                dt.as_datetime()
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Number(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // #N/A / #DIV/0! 等错误单元格按缺失处理
        Data::Error(_) => CellValue::Empty,
    }
}

// ==========================================
// InMemoryWorkbook - 内存工作簿
// ==========================================
// 用途: 上游已完成解析时直接喂入单元格;测试夹具
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: Vec<(String, Result<SheetRows, String>)>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加工作表（rows 含表头）
    pub fn with_sheet(mut self, name: impl Into<String>, rows: SheetRows) -> Self {
        self.sheets.push((name.into(), Ok(rows)));
        self
    }

    /// 添加一张读取时会失败的工作表
    pub fn with_unreadable_sheet(
        mut self,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.sheets.push((name.into(), Err(message.into())));
        self
    }
}

impl WorkbookSource for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> ImportResult<SheetRows> {
        match self.sheets.iter().find(|(name, _)| name == sheet_name) {
            Some((_, Ok(rows))) => Ok(rows.clone()),
            Some((_, Err(message))) => Err(ImportError::SheetReadError {
                sheet: sheet_name.to_string(),
                message: message.clone(),
            }),
            None => Err(ImportError::SheetNotFound(sheet_name.to_string())),
        }
    }
}
