// ==========================================
// Emerald Inventory - 命令行入口
// ==========================================
// 用法: emerald-inventory <workbook> [output_dir] [config.json]
// 输出: CSV 产物（仅成功时）+ conversion_report.json（总是写出）
// 退出码: 0 成功 / 1 转换失败 / 2 参数错误
// ==========================================

use anyhow::Context;
use emerald_inventory::config::ConfigManager;
use emerald_inventory::domain::report::{ConversionOutcome, DiagnosticLevel, SheetStatus};
use emerald_inventory::export::{ConversionReport, CsvArtifactSet};
use emerald_inventory::i18n::{self, t, t_with_args};
use emerald_inventory::importer::{WorkbookConverter, WorkbookConverterImpl};
use emerald_inventory::logging;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT_DIR: &str = "output";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    i18n::init_from_env();

    let mut args = std::env::args();
    let bin = args.next().unwrap_or_else(|| "emerald-inventory".to_string());

    let workbook = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("{}", t_with_args("cli.usage", &[("bin", bin.as_str())]));
            std::process::exit(2);
        }
    };
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let config_path = args.next().map(PathBuf::from);

    if !workbook.exists() {
        eprintln!(
            "{}",
            t_with_args(
                "import.file_not_found",
                &[("path", workbook.display().to_string().as_str())]
            )
        );
        std::process::exit(2);
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", emerald_inventory::APP_NAME, emerald_inventory::VERSION);
    tracing::info!("==================================================");

    let config = ConfigManager::load_or_default(config_path.as_deref())
        .context("failed to load conversion config")?;
    match &config_path {
        Some(path) => println!(
            "{}",
            t_with_args("cli.config_loaded", &[("path", path.display().to_string().as_str())])
        ),
        None => println!("{}", t("cli.config_default")),
    }

    let converter = WorkbookConverterImpl::new(config);
    let outcome = converter.convert_file(&workbook).await;

    print_summary(&workbook, &outcome);

    let snapshot = converter.config().snapshot_json().ok();
    let report_path = ConversionReport::new(&outcome, snapshot)
        .write_to_dir(&output_dir)
        .context("failed to write conversion report")?;

    if !outcome.succeeded() {
        println!(
            "{}",
            t_with_args(
                "summary.failed",
                &[(
                    "count",
                    outcome.count_level(DiagnosticLevel::Fatal).to_string().as_str()
                )]
            )
        );
        println!(
            "{}",
            t_with_args("summary.report", &[("path", report_path.display().to_string().as_str())])
        );
        std::process::exit(1);
    }

    let written = CsvArtifactSet::from_outcome(&outcome)
        .and_then(|artifacts| artifacts.write_to_dir(&output_dir))
        .context("failed to write CSV artifacts")?;

    println!(
        "{}",
        t_with_args(
            "summary.succeeded",
            &[
                ("count", written.len().to_string().as_str()),
                ("dir", output_dir.display().to_string().as_str()),
            ]
        )
    );
    println!(
        "{}",
        t_with_args("summary.report", &[("path", report_path.display().to_string().as_str())])
    );
    Ok(())
}

fn print_summary(workbook: &Path, outcome: &ConversionOutcome) {
    let summary = &outcome.summary;

    println!("{}", t("summary.title"));
    println!(
        "{}",
        t_with_args("summary.source", &[("path", workbook.display().to_string().as_str())])
    );

    for sheet in &summary.sheets {
        let status = match sheet.status {
            SheetStatus::Processed => t("status.processed"),
            SheetStatus::Missing => t("status.missing"),
            SheetStatus::Failed => t("status.failed"),
        };
        println!(
            "{}",
            t_with_args(
                "summary.sheet_line",
                &[
                    ("sheet", sheet.sheet_name.as_str()),
                    ("stage", sheet.stage.label()),
                    ("status", status.as_str()),
                    ("records", sheet.records_emitted.to_string().as_str()),
                    ("skipped", sheet.rows_skipped.to_string().as_str()),
                    ("soft_errors", sheet.soft_errors.to_string().as_str()),
                ]
            )
        );
    }

    println!(
        "{}",
        t_with_args(
            "summary.lots",
            &[
                ("count", summary.unique_lots.to_string().as_str()),
                ("updates", summary.weight_updates.to_string().as_str()),
            ]
        )
    );
    println!(
        "{}",
        t_with_args(
            "summary.records",
            &[("count", summary.total_records.to_string().as_str())]
        )
    );
    println!(
        "{}",
        t_with_args(
            "summary.unused_lots",
            &[("count", summary.unused_lots.to_string().as_str())]
        )
    );

    // 信息级诊断（未引用批次）只进报告
    for diagnostic in outcome
        .diagnostics()
        .iter()
        .filter(|d| d.level > DiagnosticLevel::Info)
    {
        println!(
            "{}",
            t_with_args("summary.diagnostic", &[("line", diagnostic.to_string().as_str())])
        );
    }
}
