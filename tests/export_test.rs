// ==========================================
// CSV 导出集成测试
// ==========================================
// 测试目标: 转换结果 → CSV 产物的一致性
// ==========================================

mod test_helpers;

use emerald_inventory::config::ConfigManager;
use emerald_inventory::domain::lot::{Lot, ProcessingRecord};
use emerald_inventory::domain::report::{DiagnosticLevel, IntegrityIssue, IntegrityReport};
use emerald_inventory::export::{CsvArtifactSet, LOTS_FILE, RECORDS_FILE};
use emerald_inventory::importer::{
    FieldNormalizerImpl, ImportError, IntegrityValidator, WorkbookConverterImpl,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::{data_row, in_memory_workbook, sheet};

fn artifacts_for_sample() -> CsvArtifactSet {
    let mut workbook = in_memory_workbook(vec![
        (
            "CUT SHEET",
            sheet(vec![
                data_row("14-06-2025", "L-100", 12.0, (25.0, 3.5), (24.0, 11.8)),
                data_row("14-06-2025", "L-020", 4.0, (0.0, 0.0), (10.0, 3.9)),
            ]),
        ),
        ("MM SHEET", sheet(vec![])),
        (
            "POLISH SHEET",
            sheet(vec![data_row("13-06-2025", "L-100", 12.5, (24.0, 11.8), (24.0, 11.2))]),
        ),
    ]);

    let converter = WorkbookConverterImpl::new(ConfigManager::new());
    let outcome = converter.convert_source(&mut workbook, None);
    CsvArtifactSet::from_outcome(&outcome).unwrap()
}

fn parse(content: &str) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().unwrap().clone();
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}

#[test]
fn test_records_reference_lots_csv() {
    let artifacts = artifacts_for_sample();
    let lots = parse(artifacts.get(LOTS_FILE).unwrap());
    let records = parse(artifacts.get(RECORDS_FILE).unwrap());

    // 批次按批次号排序
    let numbers: Vec<&str> = lots.iter().map(|l| l["lot_number"].as_str()).collect();
    assert_eq!(numbers, vec!["L-020", "L-100"]);
    assert_eq!(lots[1]["lot_weight"], "12.5000");
    assert_eq!(lots[1]["status"], "active");

    let lot_ids: HashMap<&str, &str> = lots
        .iter()
        .map(|l| (l["lot_number"].as_str(), l["lot_id"].as_str()))
        .collect();
    for record in &records {
        assert_eq!(lot_ids[record["lot_number"].as_str()], record["lot_id"]);
    }
}

#[test]
fn test_records_csv_order_and_formatting() {
    let artifacts = artifacts_for_sample();
    let content = artifacts.get(RECORDS_FILE).unwrap();
    assert!(content.starts_with(
        "record_id,lot_id,lot_number,stage,process_date,given_pieces,given_weight,received_pieces,received_weight\n"
    ));

    let records = parse(content);
    let order: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r["process_date"].as_str(), r["stage"].as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2025-06-13", "POLISH"),
            ("2025-06-14", "CUT"),
            ("2025-06-14", "CUT"),
        ]
    );

    // CUT 的发出列被忽略
    let cut = &records[1];
    assert_eq!(cut["given_pieces"], "");
    assert_eq!(cut["given_weight"], "0.0000");
    assert_eq!(records[0]["given_pieces"], "24");
    assert_eq!(records[0]["received_weight"], "11.2000");
}

#[test]
fn test_per_stage_files_for_processed_sheets() {
    let artifacts = artifacts_for_sample();
    let names: Vec<&str> = artifacts.file_names().collect();

    assert!(names.contains(&"cut_records.csv"));
    assert!(names.contains(&"mm_records.csv"));
    assert!(names.contains(&"polish_records.csv"));
    assert!(!names.contains(&"ghat_records.csv"));

    assert_eq!(parse(artifacts.get("cut_records.csv").unwrap()).len(), 2);
    assert_eq!(parse(artifacts.get("polish_records.csv").unwrap()).len(), 1);
    // 处理过但没有记录: 只有表头
    assert!(parse(artifacts.get("mm_records.csv").unwrap()).is_empty());
}

#[test]
fn test_write_to_dir_creates_all_files() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts_for_sample();
    let written = artifacts.write_to_dir(dir.path()).unwrap();

    assert_eq!(written.len(), artifacts.len());
    for name in artifacts.file_names() {
        let on_disk = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(on_disk, artifacts.get(name).unwrap());
    }
}

#[test]
fn test_failed_run_produces_no_artifacts() {
    let converter = WorkbookConverterImpl::new(ConfigManager::new());
    let outcome = converter.convert_path(Path::new("missing_workbook.xlsx"));

    let result = CsvArtifactSet::from_outcome(&outcome);
    assert!(matches!(result, Err(ImportError::RunFailed { fatal: 1 })));
}

/// 把每条记录都判为悬空引用的校验器
struct OrphanEverything;

impl IntegrityValidator for OrphanEverything {
    fn validate(&self, _lots: &[Lot], records: &[ProcessingRecord]) -> IntegrityReport {
        IntegrityReport {
            issues: records
                .iter()
                .map(|r| IntegrityIssue::OrphanedReference {
                    record_id: r.record_id,
                    lot_id: r.lot_id,
                    lot_number: r.lot_number.clone(),
                })
                .collect(),
        }
    }
}

#[test]
fn test_integrity_failure_suppresses_output() {
    let converter = WorkbookConverterImpl::with_components(
        ConfigManager::new(),
        Arc::new(FieldNormalizerImpl::default()),
        Arc::new(OrphanEverything),
    );
    let mut workbook = in_memory_workbook(vec![(
        "GHAT SHEET",
        sheet(vec![
            data_row("14-06-2025", "L-1", 1.0, (1.0, 1.0), (1.0, 1.0)),
            data_row("15-06-2025", "L-2", 2.0, (1.0, 1.0), (1.0, 1.0)),
        ]),
    )]);

    let outcome = converter.convert_source(&mut workbook, None);
    assert!(!outcome.succeeded());
    assert!(outcome.output.is_none());
    assert_eq!(outcome.count_level(DiagnosticLevel::Fatal), 2);
    assert_eq!(outcome.summary.total_records, 2);

    let result = CsvArtifactSet::from_outcome(&outcome);
    assert!(matches!(result, Err(ImportError::RunFailed { fatal: 2 })));
}
