use serde::{Deserialize, Serialize};

/// Inventory item as returned by the code lookup endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub characteristics: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An item held in the loan draft, with the fields edited before submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedItem {
    pub item_id: i64,
    pub code: String,
    pub name: String,
    pub stock: u32,
    pub quantity: u32,
    pub exit_condition_id: Option<i64>,
    pub exit_observations: String,
    pub image: Option<String>,
    pub characteristics: Option<String>,
}

impl ScannedItem {
    /// Upper bound for `quantity`. An item reported with zero stock can still be lent once.
    pub fn max_quantity(&self) -> u32 {
        self.stock.max(1)
    }
}

impl From<ItemRecord> for ScannedItem {
    fn from(record: ItemRecord) -> Self {
        Self {
            item_id: record.id,
            code: record.code,
            name: record.name,
            stock: record.stock,
            quantity: 1,
            exit_condition_id: None,
            exit_observations: String::new(),
            image: record.image,
            characteristics: record.characteristics,
        }
    }
}
