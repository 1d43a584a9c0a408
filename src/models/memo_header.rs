use chrono::NaiveDate;

/// Fields printed above the line items.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoHeader {
    pub date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
}

impl MemoHeader {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            customer_name: String::new(),
            customer_address: String::new(),
            customer_phone: String::new(),
        }
    }
}
