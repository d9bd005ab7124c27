// ==========================================
// Emerald Inventory - 引用完整性校验器实现
// ==========================================
// 职责: 序列化前检查批次表与加工记录表的引用一致性
// 致命: 悬空引用 / 批次号不一致 / 批次号重复 / record_id 重复
// 提示: 未被引用的批次
// ==========================================

use crate::domain::lot::{Lot, LotId, ProcessingRecord};
use crate::domain::report::{IntegrityIssue, IntegrityReport};
use crate::importer::converter_trait::IntegrityValidator as IntegrityValidatorTrait;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityValidator;

impl IntegrityValidator {
    pub fn new() -> Self {
        Self
    }
}

impl IntegrityValidatorTrait for IntegrityValidator {
    fn validate(&self, lots: &[Lot], records: &[ProcessingRecord]) -> IntegrityReport {
        let mut issues = Vec::new();

        // 批次号唯一
        let mut seen_numbers = HashSet::new();
        for lot in lots {
            if !seen_numbers.insert(lot.lot_number.as_str()) {
                issues.push(IntegrityIssue::DuplicateLotNumber {
                    lot_number: lot.lot_number.clone(),
                });
            }
        }

        let by_id: HashMap<LotId, &Lot> = lots.iter().map(|lot| (lot.lot_id, lot)).collect();
        let mut referenced = HashSet::new();
        let mut seen_records = HashSet::new();

        for record in records {
            if !seen_records.insert(record.record_id) {
                issues.push(IntegrityIssue::DuplicateRecordId {
                    record_id: record.record_id,
                });
            }

            match by_id.get(&record.lot_id) {
                Some(lot) => {
                    referenced.insert(record.lot_id);
                    if lot.lot_number != record.lot_number {
                        issues.push(IntegrityIssue::LotNumberMismatch {
                            record_id: record.record_id,
                            lot_id: lot.lot_id,
                            expected: lot.lot_number.clone(),
                            found: record.lot_number.clone(),
                        });
                    }
                }
                None => issues.push(IntegrityIssue::OrphanedReference {
                    record_id: record.record_id,
                    lot_id: record.lot_id,
                    lot_number: record.lot_number.clone(),
                }),
            }
        }

        // 未引用批次（按批次创建顺序）
        for lot in lots.iter().filter(|lot| !referenced.contains(&lot.lot_id)) {
            issues.push(IntegrityIssue::UnusedLot {
                lot_id: lot.lot_id,
                lot_number: lot.lot_number.clone(),
            });
        }

        let report = IntegrityReport { issues };
        let fatal = report.fatal_issues().count();
        if fatal > 0 {
            warn!(fatal = fatal, "引用完整性校验未通过");
        } else {
            debug!(
                lots = lots.len(),
                records = records.len(),
                unused = report.unused_lots().count(),
                "引用完整性校验通过"
            );
        }
        report
    }
}
