// ==========================================
// Emerald Inventory - 领域类型定义
// ==========================================
// 职责: 加工工序 / 批次状态 / 单元格值
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 加工工序 (Stage)
// ==========================================
// 固定四道工序,不支持扩展
// 序列化格式: SCREAMING_SNAKE_CASE (与导出 CSV 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Cut,    // 切割
    Ghat,   // 打坯
    Mm,     // MM 定尺
    Polish, // 抛光
}

impl Stage {
    /// 按工作簿中的默认顺序列出全部工序
    pub const ALL: [Stage; 4] = [Stage::Cut, Stage::Ghat, Stage::Mm, Stage::Polish];

    /// 导出标签（CUT/GHAT/MM/POLISH）
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Cut => "CUT",
            Stage::Ghat => "GHAT",
            Stage::Mm => "MM",
            Stage::Polish => "POLISH",
        }
    }

    /// 默认工作表名称
    pub fn default_sheet_name(&self) -> &'static str {
        match self {
            Stage::Cut => "CUT SHEET",
            Stage::Ghat => "GHAT SHEET",
            Stage::Mm => "MM SHEET",
            Stage::Polish => "POLISH SHEET",
        }
    }

    /// 分工序导出文件名（如 cut_records.csv）
    pub fn records_file_name(&self) -> String {
        format!("{}_records.csv", self.label().to_lowercase())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUT" => Ok(Stage::Cut),
            "GHAT" => Ok(Stage::Ghat),
            "MM" => Ok(Stage::Mm),
            "POLISH" => Ok(Stage::Polish),
            other => Err(format!("未知工序: {}", other)),
        }
    }
}

// ==========================================
// 批次状态 (Lot Status)
// ==========================================
// 本流程中批次创建即为 active,无其他状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    #[default]
    Active,
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotStatus::Active => write!(f, "active"),
        }
    }
}

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 读取边界统一产出,下游按变体匹配,不再猜测类型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl CellValue {
    /// 空白判定: Empty 或去空白后为空的文本
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// 便于测试与内存工作簿构造
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels_and_files() {
        assert_eq!(Stage::Cut.label(), "CUT");
        assert_eq!(Stage::Polish.to_string(), "POLISH");
        assert_eq!(Stage::Mm.records_file_name(), "mm_records.csv");
        assert_eq!(Stage::Ghat.default_sheet_name(), "GHAT SHEET");
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!("cut".parse::<Stage>().unwrap(), Stage::Cut);
        assert_eq!(" Polish ".parse::<Stage>().unwrap(), Stage::Polish);
        assert!("SAW".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_serde_uses_labels() {
        let json = serde_json::to_string(&Stage::Ghat).unwrap();
        assert_eq!(json, "\"GHAT\"");
        let stage: Stage = serde_json::from_str("\"MM\"").unwrap();
        assert_eq!(stage, Stage::Mm);
    }

    #[test]
    fn test_cell_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::text("x").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }
}
