use indexmap::IndexMap;

use crate::error::{AppError, AppResult};
use crate::models::{LoanItemLine, ScannedItem};

/// Scanned items of one draft, keyed by code in scan order
#[derive(Debug, Clone)]
pub struct ItemAccumulator {
    items: IndexMap<String, ScannedItem>,
    observations_max_len: usize,
}

impl ItemAccumulator {
    pub fn new(observations_max_len: usize) -> Self {
        Self {
            items: IndexMap::new(),
            observations_max_len,
        }
    }

    /// Insert with quantity 1 and no exit condition. A code already present is
    /// rejected and the existing entry is left untouched.
    pub fn add_item(&mut self, item: impl Into<ScannedItem>) -> AppResult<&ScannedItem> {
        let mut item = item.into();
        item.code = item.code.trim().to_string();
        if item.code.is_empty() {
            return Err(AppError::InvalidInput("item has no code".to_string()));
        }
        if self.items.contains_key(&item.code) {
            tracing::debug!("Rejected duplicate scan: code={}", item.code);
            return Err(AppError::Duplicate(item.code));
        }

        item.quantity = 1;
        item.exit_condition_id = None;
        item.exit_observations.clear();

        let code = item.code.clone();
        let (index, _) = self.items.insert_full(code, item);
        Ok(&self.items[index])
    }

    pub fn remove_item(&mut self, code: &str) -> Option<ScannedItem> {
        self.items.shift_remove(code.trim())
    }

    /// Store `quantity` clamped to `[1, stock]`. Returns the stored value.
    pub fn set_quantity(&mut self, code: &str, quantity: i64) -> Option<u32> {
        let item = self.items.get_mut(code.trim())?;
        let max = i64::from(item.max_quantity());
        item.quantity = quantity.clamp(1, max) as u32;
        Some(item.quantity)
    }

    pub fn set_condition(&mut self, code: &str, condition_id: Option<i64>) -> bool {
        match self.items.get_mut(code.trim()) {
            Some(item) => {
                item.exit_condition_id = condition_id;
                true
            }
            None => false,
        }
    }

    /// Store observations truncated to the configured number of characters
    pub fn set_observations(&mut self, code: &str, text: &str) -> Option<&str> {
        let max = self.observations_max_len;
        let item = self.items.get_mut(code.trim())?;
        item.exit_observations = truncate_chars(text, max);
        Some(item.exit_observations.as_str())
    }

    pub fn get(&self, code: &str) -> Option<&ScannedItem> {
        self.items.get(code.trim())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.items.contains_key(code.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScannedItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn observations_max_len(&self) -> usize {
        self.observations_max_len
    }

    /// Lines for the loan payload, in scan order
    pub fn to_lines(&self) -> Vec<LoanItemLine> {
        self.items
            .values()
            .map(|item| LoanItemLine {
                item_id: item.item_id,
                code: item.code.clone(),
                quantity: item.quantity,
                exit_condition_id: item.exit_condition_id,
                exit_observations: item.exit_observations.clone(),
            })
            .collect()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemRecord;

    fn record(id: i64, code: &str, stock: u32) -> ItemRecord {
        ItemRecord {
            id,
            code: code.to_string(),
            name: format!("Item {}", code),
            stock,
            image: None,
            characteristics: None,
            description: None,
        }
    }

    #[test]
    fn test_add_sets_defaults() {
        let mut items = ItemAccumulator::new(250);
        let added = items.add_item(record(1, " A1 ", 5)).unwrap();
        assert_eq!(added.code, "A1");
        assert_eq!(added.quantity, 1);
        assert_eq!(added.exit_condition_id, None);
    }

    #[test]
    fn test_blank_code_rejected() {
        let mut items = ItemAccumulator::new(250);
        assert!(matches!(
            items.add_item(record(1, "", 5)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            items.add_item(record(2, "  \t ", 5)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(items.is_empty());
        assert!(!items.contains(""));
    }

    #[test]
    fn test_duplicate_rejected_without_mutation() {
        let mut items = ItemAccumulator::new(250);
        items.add_item(record(1, "A1", 5)).unwrap();
        items.set_quantity("A1", 3);

        let err = items.add_item(record(99, "A1", 1)).unwrap_err();
        assert!(matches!(err, AppError::Duplicate(code) if code == "A1"));
        assert_eq!(items.len(), 1);
        assert_eq!(items.get("A1").unwrap().quantity, 3);
        assert_eq!(items.get("A1").unwrap().item_id, 1);
    }

    #[test]
    fn test_codes_stay_unique_over_any_add_sequence() {
        let mut items = ItemAccumulator::new(250);
        let codes = ["A", "B", "A", "C", "B", "B", "D", "A", "C"];
        let mut seed: usize = 17;
        for i in 0..200 {
            seed = seed.wrapping_mul(31).wrapping_add(7) % 1009;
            let code = codes[seed % codes.len()];
            let _ = items.add_item(record(i, code, 3));
            if seed % 5 == 0 {
                items.remove_item(code);
            }

            let mut seen: Vec<&str> = items.iter().map(|item| item.code.as_str()).collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), total);
        }
    }

    #[test]
    fn test_quantity_clamps_to_stock() {
        let mut items = ItemAccumulator::new(250);
        items.add_item(record(1, "A", 5)).unwrap();

        assert_eq!(items.set_quantity("A", 7), Some(5));
        assert_eq!(items.set_quantity("A", 0), Some(1));
        assert_eq!(items.set_quantity("A", -4), Some(1));
        assert_eq!(items.set_quantity("A", 4), Some(4));
        assert_eq!(items.get("A").unwrap().quantity, 4);
    }

    #[test]
    fn test_zero_stock_allows_single_unit() {
        let mut items = ItemAccumulator::new(250);
        items.add_item(record(1, "Z", 0)).unwrap();
        assert_eq!(items.set_quantity("Z", 3), Some(1));
    }

    #[test]
    fn test_absent_codes_are_noops() {
        let mut items = ItemAccumulator::new(250);
        assert!(items.remove_item("missing").is_none());
        assert!(items.set_quantity("missing", 2).is_none());
        assert!(!items.set_condition("missing", Some(1)));
        assert!(items.set_observations("missing", "scratched").is_none());
        assert!(items.is_empty());
    }

    #[test]
    fn test_observations_truncated_by_chars() {
        let mut items = ItemAccumulator::new(5);
        items.add_item(record(1, "A", 1)).unwrap();
        assert_eq!(items.set_observations("A", "ñandúes y más"), Some("ñandú"));
        assert_eq!(items.set_observations("A", "ok"), Some("ok"));
    }

    #[test]
    fn test_lines_follow_scan_order() {
        let mut items = ItemAccumulator::new(250);
        items.add_item(record(1, "B", 2)).unwrap();
        items.add_item(record(2, "A", 2)).unwrap();
        items.add_item(record(3, "C", 2)).unwrap();
        items.remove_item("A");
        items.set_condition("C", Some(4));

        let lines = items.to_lines();
        let codes: Vec<&str> = lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "C"]);
        assert_eq!(lines[1].exit_condition_id, Some(4));
    }
}
