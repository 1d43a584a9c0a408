/// Description every freshly added row starts with.
pub const DEFAULT_DESCRIPTION: &str = "Cockroach Pest";
pub const DEFAULT_QUANTITY: &str = "1";
pub const DEFAULT_UNIT_PRICE: &str = "135";

/// One row of the memo.
///
/// Quantity and unit price are kept as the raw text the user typed; they are
/// only interpreted when the row is recalculated. `row_total` is written by
/// recalculation and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub serial: u32,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub(crate) row_total: f64,
}

impl LineItem {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            description: DEFAULT_DESCRIPTION.to_string(),
            quantity: DEFAULT_QUANTITY.to_string(),
            unit_price: DEFAULT_UNIT_PRICE.to_string(),
            row_total: 0.0,
        }
    }

    pub fn row_total(&self) -> f64 {
        self.row_total
    }
}
