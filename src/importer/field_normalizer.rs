// ==========================================
// Emerald Inventory - 字段规范化器实现
// ==========================================
// 职责: 单元格 → 日期 / 批次号 / 小数 / 整数
// 约定: 全部为全函数,失败返回明确的 "无值",不抛错
// ==========================================

use crate::domain::lot::ProcessDate;
use crate::domain::types::CellValue;
use crate::importer::converter_trait::FieldNormalizer as FieldNormalizerTrait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// 小数保留位数
pub const DECIMAL_SCALE: i32 = 4;

// ==========================================
// 日期解析策略（按顺序尝试,首个成功者生效）
// ==========================================
type DateStrategy = fn(&str) -> Option<ProcessDate>;

const DATE_STRATEGIES: &[(&str, DateStrategy)] = &[
    ("day_first_dash", day_first_dash),
    ("day_first_slash", day_first_slash),
    ("iso_date", iso_date),
    ("date_time", date_time),
    ("rfc3339", rfc3339),
    ("month_name", month_name),
    ("month_first", month_first),
];

/// DD-MM-YYYY: 首段为两位数字时直接重组,不做日历校验
fn day_first_dash(value: &str) -> Option<ProcessDate> {
    day_first(value, '-')
}

/// DD/MM/YYYY
fn day_first_slash(value: &str) -> Option<ProcessDate> {
    day_first(value, '/')
}

fn day_first(value: &str, separator: char) -> Option<ProcessDate> {
    let parts: Vec<&str> = value.split(separator).collect();
    if parts.len() != 3 {
        return None;
    }
    let (day, month, year) = (parts[0], parts[1], parts[2]);
    if day.len() == 2 && day.chars().all(|c| c.is_ascii_digit()) {
        Some(ProcessDate::from_parts(year, month, day))
    } else {
        None
    }
}

fn iso_date(value: &str) -> Option<ProcessDate> {
    ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(ProcessDate::from_naive)
}

fn date_time(value: &str) -> Option<ProcessDate> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    .map(|dt| ProcessDate::from_naive(dt.date()))
}

fn rfc3339(value: &str) -> Option<ProcessDate> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| ProcessDate::from_naive(dt.date_naive()))
}

/// 14 Jun 2025 / June 14, 2025 等英文月份写法
fn month_name(value: &str) -> Option<ProcessDate> {
    ["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%d-%b-%Y", "%d-%B-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(ProcessDate::from_naive)
}

/// 月优先（仅当首段不是两位时才会走到这里,如 6/14/2025）
fn month_first(value: &str) -> Option<ProcessDate> {
    ["%m/%d/%Y", "%m-%d-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(ProcessDate::from_naive)
}

/// 表格序列日期（1899-12-30 起算）→ 日期
fn serial_to_date(serial: f64) -> Option<ProcessDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch
        .checked_add_signed(Duration::days(serial.trunc() as i64))
        .map(ProcessDate::from_naive)
}

/// 文本 → 浮点（去首尾空白,拒绝 NaN/inf）
fn parse_finite(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn cell_to_f64(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_finite(s),
        _ => None,
    }
}

/// 四舍五入到 DECIMAL_SCALE 位;整数值保持原样
pub fn round_decimal(value: f64) -> f64 {
    if value.fract() == 0.0 {
        return value;
    }
    let factor = 10f64.powi(DECIMAL_SCALE);
    (value * factor).round() / factor
}

// ==========================================
// FieldNormalizer - 字段规范化器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNormalizer {
    uppercase_lot_numbers: bool,
}

impl FieldNormalizer {
    pub fn new(uppercase_lot_numbers: bool) -> Self {
        Self {
            uppercase_lot_numbers,
        }
    }

    /// 文本清洗（TRIM + 可选 UPPER）
    pub fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 按策略列表解析日期文本,返回命中的策略名（便于调试）
    pub fn parse_date_text(&self, value: &str) -> Option<(&'static str, ProcessDate)> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        DATE_STRATEGIES
            .iter()
            .find_map(|(name, strategy)| strategy(value).map(|date| (*name, date)))
    }
}

impl FieldNormalizerTrait for FieldNormalizer {
    fn normalize_date(&self, cell: &CellValue) -> Option<ProcessDate> {
        match cell {
            CellValue::Empty => None,
            CellValue::Date(dt) => Some(ProcessDate::from_naive(dt.date())),
            CellValue::Number(serial) => serial_to_date(*serial),
            CellValue::Text(s) => self.parse_date_text(s).map(|(_, date)| date),
        }
    }

    fn normalize_lot_number(&self, cell: &CellValue) -> Option<String> {
        let raw = match cell {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.clone(),
            // f64 的 Display 对整数值不带 ".0",且不会截断大数
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        let cleaned = self.clean_text(&raw, self.uppercase_lot_numbers);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn normalize_decimal(&self, cell: &CellValue, default: f64) -> f64 {
        cell_to_f64(cell).map(round_decimal).unwrap_or(default)
    }

    fn normalize_integer(&self, cell: &CellValue, default: Option<i64>) -> Option<i64> {
        match cell_to_f64(cell) {
            Some(v) if v >= i64::MIN as f64 && v <= i64::MAX as f64 => Some(v.trunc() as i64),
            _ => default,
        }
    }
}
