// ==========================================
// Emerald Inventory - 配置层
// ==========================================
// 职责: 转换配置管理（工作表映射 / 工序规则 / 批次号规范化）
// 存储: JSON 文件,缺省键取默认值
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_config_path, ConfigManager, ConversionConfig};
pub use import_config_trait::{ImportConfigReader, SheetMapping};
