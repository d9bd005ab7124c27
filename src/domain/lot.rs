// ==========================================
// Emerald Inventory - 批次与加工记录领域模型
// ==========================================
// 职责: Lot（批次登记）/ ProcessingRecord（工序加工记录）
// 关系: Lot 1:N ProcessingRecord（按批次号匹配,不按行序）
// ==========================================

use crate::domain::types::{LotStatus, Stage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 批次代理键
pub type LotId = Uuid;

/// 加工记录代理键
pub type RecordId = Uuid;

// ==========================================
// ProcessDate - 规范化加工日期
// ==========================================
// 规范文本 YYYY-MM-DD;日优先规则重组时不做日历校验,
// 因此不能强制落到 NaiveDate。排序按文本比较。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessDate(String);

impl ProcessDate {
    pub fn from_naive(date: NaiveDate) -> Self {
        ProcessDate(date.format("%Y-%m-%d").to_string())
    }

    /// 由日/月/年片段重组（月、日补零到两位,年份原样保留）
    pub fn from_parts(year: &str, month: &str, day: &str) -> Self {
        ProcessDate(format!("{}-{:0>2}-{:0>2}", year, month, day))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==========================================
// Lot - 批次
// ==========================================
// 红线: lot_id 一经分配不可变;同一运行内每个批次号仅一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub lot_id: LotId,         // 代理键（UUID v4）
    pub lot_number: String,    // 自然键（已规范化）
    pub lot_weight: f64,       // 批次重量（4 位小数）
    pub status: LotStatus,     // 固定 active
}

impl Lot {
    pub fn new(lot_number: String, lot_weight: f64) -> Self {
        Self {
            lot_id: Uuid::new_v4(),
            lot_number,
            lot_weight,
            status: LotStatus::Active,
        }
    }
}

// ==========================================
// ProcessingRecord - 工序加工记录
// ==========================================
// 红线: 仅当日期与批次号均规范化成功时创建,创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub record_id: RecordId,            // 代理键（UUID v4）
    pub lot_id: LotId,                  // 外键 → Lot
    pub lot_number: String,             // 冗余批次号（审计用）
    pub stage: Stage,                   // 工序
    pub process_date: ProcessDate,      // 加工日期
    pub given_pieces: Option<i64>,      // 发出件数
    pub given_weight: f64,              // 发出重量
    pub received_pieces: Option<i64>,   // 收回件数
    pub received_weight: f64,           // 收回重量
}
