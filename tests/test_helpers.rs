// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 构造工序表行、内存工作簿与真实 .xlsx 工作簿
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use emerald_inventory::domain::types::CellValue;
use emerald_inventory::importer::{InMemoryWorkbook, SheetRows};
use rust_xlsxwriter::{Format, Workbook};
use std::error::Error;
use std::path::Path;

/// 标准表头
pub fn header_row() -> Vec<CellValue> {
    [
        "DATE",
        "LOT NO.",
        "LOT WEIGHT",
        "GIVEN PCS",
        "GIVEN WT",
        "RECEIVED PCS",
        "RECEIVED WT",
    ]
    .iter()
    .map(|h| CellValue::text(*h))
    .collect()
}

pub fn text(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Empty
    } else {
        CellValue::text(value)
    }
}

pub fn num(value: f64) -> CellValue {
    CellValue::Number(value)
}

pub fn date(year: i32, month: u32, day: u32) -> CellValue {
    let dt = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    CellValue::Date(dt)
}

/// 完整数据行（日期文本、批次号、批次重量、发出件数/重量、收回件数/重量）
pub fn data_row(
    date: &str,
    lot_number: &str,
    lot_weight: f64,
    given: (f64, f64),
    received: (f64, f64),
) -> Vec<CellValue> {
    vec![
        text(date),
        text(lot_number),
        num(lot_weight),
        num(given.0),
        num(given.1),
        num(received.0),
        num(received.1),
    ]
}

/// 表头 + 数据行
pub fn sheet(rows: Vec<Vec<CellValue>>) -> SheetRows {
    let mut all = vec![header_row()];
    all.extend(rows);
    all
}

/// 内存工作簿
pub fn in_memory_workbook(sheets: Vec<(&str, SheetRows)>) -> InMemoryWorkbook {
    sheets
        .into_iter()
        .fold(InMemoryWorkbook::new(), |workbook, (name, rows)| {
            workbook.with_sheet(name, rows)
        })
}

fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (dt.date() - epoch).num_days() as f64
}

/// 写出真实的 .xlsx 工作簿（日期单元格写成带日期格式的序列值）
pub fn write_xlsx(path: &Path, sheets: &[(&str, SheetRows)]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;

        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (r, c) = (row_idx as u32, col_idx as u16);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(r, c, s.as_str())?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    CellValue::Date(dt) => {
                        worksheet.write_number_with_format(r, c, excel_serial(dt), &date_format)?;
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
