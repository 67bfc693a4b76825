use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Closed list of spending categories. Wire names match the spreadsheet
/// exactly, so serde renames cover the multi-word ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    #[serde(rename = "Dining Out")]
    DiningOut,
    Transportation,
    Housing,
    Utilities,
    Health,
    Entertainment,
    Clothing,
    Travel,
    #[serde(rename = "Gifts/Charity")]
    GiftsCharity,
    Other,
    #[serde(rename = "General Merchandise")]
    GeneralMerchandise,
    #[serde(rename = "Auto repair")]
    AutoRepair,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Groceries,
        Category::DiningOut,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Health,
        Category::Entertainment,
        Category::Clothing,
        Category::Travel,
        Category::GiftsCharity,
        Category::Other,
        Category::GeneralMerchandise,
        Category::AutoRepair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::DiningOut => "Dining Out",
            Category::Transportation => "Transportation",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Health => "Health",
            Category::Entertainment => "Entertainment",
            Category::Clothing => "Clothing",
            Category::Travel => "Travel",
            Category::GiftsCharity => "Gifts/Charity",
            Category::Other => "Other",
            Category::GeneralMerchandise => "General Merchandise",
            Category::AutoRepair => "Auto repair",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line item as the model reports it. Prices are pre-tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItem {
    #[serde(rename = "Item")]
    pub name: String,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Taxable", default)]
    pub taxable: bool,
}

/// A whole receipt as structured by the model. Field names follow the
/// extraction contract; anything the model omits falls back to a default
/// and is dealt with downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredReceipt {
    #[serde(rename = "Store name", default)]
    pub store: String,
    #[serde(rename = "Purchase date", default)]
    pub date: Option<String>,
    #[serde(rename = "Total amount", default)]
    pub total: f64,
    #[serde(rename = "Tax total", default)]
    pub tax_total: f64,
    #[serde(rename = "Items", default)]
    pub items: Vec<ReceiptItem>,
}

/// Identifier minted when a receipt parses successfully: `RCT-` plus six
/// random hex digits. Short enough to read off a spreadsheet row, so
/// collisions are possible at scale, just vanishingly unlikely per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptId(String);

impl ReceiptId {
    pub fn generate() -> Self {
        const HEX: &[u8] = b"0123456789ABCDEF";
        let mut rng = rand::thread_rng();
        let tail: String = (0..6)
            .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
            .collect();
        ReceiptId(format!("RCT-{tail}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One spreadsheet row: an item with its share of the receipt tax folded
/// into the final price.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedRow {
    pub receipt_id: String,
    pub store: String,
    pub date: String,
    pub item: String,
    pub category: Category,
    pub price: f64,
    pub taxable: bool,
    pub price_with_tax: f64,
}

impl AllocatedRow {
    /// The fixed 8-column row the ledger appends.
    pub fn to_cells(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::json!(self.receipt_id),
            serde_json::json!(self.store),
            serde_json::json!(self.date),
            serde_json::json!(self.item),
            serde_json::json!(self.category.as_str()),
            serde_json::json!(self.price),
            serde_json::json!(self.taxable),
            serde_json::json!(self.price_with_tax),
        ]
    }
}
