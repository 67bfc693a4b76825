use crate::error::AllocationError;
use crate::models::{AllocatedRow, ReceiptId, StructuredReceipt};

/// Round to 2 decimal places, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Distribute the receipt's tax total across its taxable items in
/// proportion to their pre-tax prices, and emit one spreadsheet row per
/// item in receipt order.
///
/// A receipt with no taxable base (no taxable items, or every taxable
/// item priced at zero) divides by 1.0 instead, so the tax stays
/// undistributed rather than blowing up.
pub fn allocate(
    id: &ReceiptId,
    receipt: &StructuredReceipt,
) -> Result<Vec<AllocatedRow>, AllocationError> {
    if receipt.items.is_empty() {
        return Err(AllocationError::NoItems);
    }
    if receipt.tax_total < 0.0 {
        return Err(AllocationError::NegativeTax(receipt.tax_total));
    }
    if let Some(item) = receipt.items.iter().find(|i| i.price < 0.0) {
        return Err(AllocationError::NegativePrice(item.name.clone()));
    }

    let taxable_subtotal: f64 = receipt
        .items
        .iter()
        .filter(|i| i.taxable)
        .map(|i| i.price)
        .sum();
    let divisor = if taxable_subtotal == 0.0 { 1.0 } else { taxable_subtotal };

    let date = receipt.date.clone().unwrap_or_default();
    let rows = receipt
        .items
        .iter()
        .map(|item| {
            let tax_share = if item.taxable {
                item.price / divisor * receipt.tax_total
            } else {
                0.0
            };
            AllocatedRow {
                receipt_id: id.as_str().to_string(),
                store: receipt.store.clone(),
                date: date.clone(),
                item: item.name.clone(),
                category: item.category,
                price: item.price,
                taxable: item.taxable,
                price_with_tax: round2(item.price + tax_share),
            }
        })
        .collect();

    Ok(rows)
}
