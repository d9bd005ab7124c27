// ==========================================
// Emerald Inventory - 运行报告导出
// ==========================================
// 职责: conversion_report.json（汇总 + 诊断 + 配置快照）
// 说明: 运行失败时同样写出,便于排查
// ==========================================

use crate::domain::report::{ConversionOutcome, ConversionSummary, Diagnostic};
use crate::importer::error::ImportResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE: &str = "conversion_report.json";

#[derive(Debug, Serialize)]
pub struct ConversionReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub app_version: &'static str,
    pub succeeded: bool,
    pub summary: &'a ConversionSummary,
    pub diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl<'a> ConversionReport<'a> {
    pub fn new(outcome: &'a ConversionOutcome, config: Option<serde_json::Value>) -> Self {
        Self {
            generated_at: Utc::now(),
            app_version: crate::VERSION,
            succeeded: outcome.succeeded(),
            summary: &outcome.summary,
            diagnostics: &outcome.diagnostics,
            config,
        }
    }

    pub fn to_json(&self) -> ImportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 写出到目录（不存在则创建）
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> ImportResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), "运行报告写出完成");
        Ok(path)
    }
}
