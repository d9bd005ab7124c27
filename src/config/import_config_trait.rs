// ==========================================
// Emerald Inventory - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::Stage;
use serde::{Deserialize, Serialize};

// ==========================================
// SheetMapping - 工作表 → 工序映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMapping {
    pub sheet_name: String,
    pub stage: Stage,
}

impl SheetMapping {
    pub fn new(sheet_name: impl Into<String>, stage: Stage) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            stage,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（JSON 文件 + 默认值）
pub trait ImportConfigReader: Send + Sync {
    /// 工作表 → 工序映射（按处理顺序）
    ///
    /// # 默认值
    /// - CUT SHEET → CUT, GHAT SHEET → GHAT, MM SHEET → MM, POLISH SHEET → POLISH
    fn sheet_mappings(&self) -> Vec<SheetMapping>;

    /// 该工序是否有 "发出" 一侧（发出件数/发出重量）
    ///
    /// # 默认值
    /// - CUT: false（该列在上游另作他用,必须忽略）
    /// - 其他: true
    fn stage_has_given_side(&self, stage: Stage) -> bool;

    /// 每张表的表头行数
    ///
    /// # 默认值
    /// - 1
    fn header_rows(&self) -> usize;

    /// 批次号是否统一转大写
    ///
    /// # 默认值
    /// - false（仅去首尾空白）
    fn uppercase_lot_numbers(&self) -> bool;
}
