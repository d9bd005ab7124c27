// ==========================================
// Emerald Inventory - 批次登记表
// ==========================================
// 职责: 按批次号去重、分配代理键、调和重量漂移
// 红线: 同一运行内每个批次号只有一个 lot_id;lot_id 分配后不变;
//       批次只增不删
// ==========================================

use crate::domain::lot::{Lot, LotId};
use crate::importer::converter_trait::LotResolver;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// LotRegistry - 批次登记表（发现阶段可写）
// ==========================================
// 运行内独占,按引用传给发现/提取两个阶段,不使用全局状态
#[derive(Debug, Default)]
pub struct LotRegistry {
    lots: Vec<Lot>,                    // 按创建顺序
    index: HashMap<String, usize>,     // 批次号 → lots 下标
    weight_updates: usize,             // 重量被覆盖次数
}

impl LotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一次批次出现
    ///
    /// # 规则
    /// - 首次出现: 新建批次、分配新 lot_id
    /// - 重复出现: 重量不同则覆盖（后出现者为准）,返回原 lot_id
    pub fn register(&mut self, lot_number: &str, lot_weight: f64) -> LotId {
        match self.index.get(lot_number) {
            Some(&idx) => {
                let lot = &mut self.lots[idx];
                if lot.lot_weight != lot_weight {
                    debug!(
                        lot_number = %lot_number,
                        old_weight = lot.lot_weight,
                        new_weight = lot_weight,
                        "批次重量更新"
                    );
                    lot.lot_weight = lot_weight;
                    self.weight_updates += 1;
                }
                lot.lot_id
            }
            None => {
                let lot = Lot::new(lot_number.to_string(), lot_weight);
                let lot_id = lot.lot_id;
                self.index.insert(lot_number.to_string(), self.lots.len());
                self.lots.push(lot);
                lot_id
            }
        }
    }

    /// 按批次号查询
    pub fn get(&self, lot_number: &str) -> Option<&Lot> {
        self.index.get(lot_number).map(|&idx| &self.lots[idx])
    }

    /// 已登记批次（按创建顺序）
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn into_lots(self) -> Vec<Lot> {
        self.lots
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn weight_updates(&self) -> usize {
        self.weight_updates
    }

    /// 只读视图,供提取阶段使用
    pub fn lookup(&self) -> LotLookup<'_> {
        LotLookup { registry: self }
    }
}

impl LotResolver for LotRegistry {
    fn resolve(&mut self, lot_number: &str, lot_weight: f64) -> Option<LotId> {
        Some(self.register(lot_number, lot_weight))
    }
}

// ==========================================
// LotLookup - 只读解析（提取阶段）
// ==========================================
// 提取阶段开始后批次不再被修改,重量参数被忽略
#[derive(Debug, Clone, Copy)]
pub struct LotLookup<'a> {
    registry: &'a LotRegistry,
}

impl LotResolver for LotLookup<'_> {
    fn resolve(&mut self, lot_number: &str, _lot_weight: f64) -> Option<LotId> {
        self.registry.get(lot_number).map(|lot| lot.lot_id)
    }
}
