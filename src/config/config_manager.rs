// ==========================================
// Emerald Inventory - 配置管理器
// ==========================================
// 职责: 配置加载（JSON 文件）、默认值、快照
// 存储: <config_dir>/emerald-inventory/config.json（可选）
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, SheetMapping};
use crate::domain::types::Stage;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ==========================================
// 配置键（JSON 字段名）
// ==========================================
pub mod config_keys {
    pub const SHEET_MAPPINGS: &str = "sheet_mappings";
}

// ==========================================
// ConversionConfig - 转换配置
// ==========================================
// 缺省字段取默认值,文件中只需写需要覆盖的键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub sheet_mappings: Vec<SheetMapping>,
    pub stages_without_given_side: Vec<Stage>,
    pub header_rows: usize,
    pub uppercase_lot_numbers: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sheet_mappings: Stage::ALL
                .iter()
                .map(|stage| SheetMapping::new(stage.default_sheet_name(), *stage))
                .collect(),
            stages_without_given_side: vec![Stage::Cut],
            header_rows: 1,
            uppercase_lot_numbers: false,
        }
    }
}

impl ConversionConfig {
    /// 校验配置（工作表名与工序均不可重复）
    pub fn validate(&self) -> ImportResult<()> {
        let mut sheet_names = HashSet::new();
        let mut stages = HashSet::new();

        for mapping in &self.sheet_mappings {
            if mapping.sheet_name.trim().is_empty() {
                return Err(ImportError::ConfigValueError {
                    key: config_keys::SHEET_MAPPINGS.to_string(),
                    message: "工作表名称不能为空".to_string(),
                });
            }
            if !sheet_names.insert(mapping.sheet_name.as_str()) {
                return Err(ImportError::ConfigValueError {
                    key: config_keys::SHEET_MAPPINGS.to_string(),
                    message: format!("工作表重复: {}", mapping.sheet_name),
                });
            }
            if !stages.insert(mapping.stage) {
                return Err(ImportError::ConfigValueError {
                    key: config_keys::SHEET_MAPPINGS.to_string(),
                    message: format!("工序重复映射: {}", mapping.stage),
                });
            }
        }

        Ok(())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: ConversionConfig,
}

impl ConfigManager {
    /// 使用默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有配置创建（会先校验）
    pub fn from_config(config: ConversionConfig) -> ImportResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        let config: ConversionConfig =
            serde_json::from_str(raw).map_err(|e| ImportError::ConfigValueError {
                key: "<root>".to_string(),
                message: e.to_string(),
            })?;
        Self::from_config(config)
    }

    /// 从 JSON 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let manager = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "已加载转换配置");
        Ok(manager)
    }

    /// 显式路径优先;否则尝试默认路径;都不存在时使用默认配置
    pub fn load_or_default(path: Option<&Path>) -> ImportResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(default_path) if default_path.exists() => Self::load(default_path),
            _ => {
                debug!("未找到配置文件,使用默认配置");
                Ok(Self::new())
            }
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// 获取配置快照（JSON 格式）,写入运行报告
    pub fn snapshot_json(&self) -> ImportResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.config)?)
    }
}

impl ImportConfigReader for ConfigManager {
    fn sheet_mappings(&self) -> Vec<SheetMapping> {
        self.config.sheet_mappings.clone()
    }

    fn stage_has_given_side(&self, stage: Stage) -> bool {
        !self.config.stages_without_given_side.contains(&stage)
    }

    fn header_rows(&self) -> usize {
        self.config.header_rows
    }

    fn uppercase_lot_numbers(&self) -> bool {
        self.config.uppercase_lot_numbers
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("emerald-inventory").join("config.json"))
}
