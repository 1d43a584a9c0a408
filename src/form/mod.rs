//! The memo form engine.
//!
//! Owns the ordered line items and the header fields, and keeps the derived
//! totals in step with them. Nothing here touches the terminal, so every user
//! action can be driven directly through [`InvoiceForm::apply`].

mod amount;
mod error;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::models::{LineItem, MemoHeader};

pub use amount::{format_amount, parse_amount, settle_amount};
pub use error::FormError;

/// Editable fields of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Serial,
    Description,
    Quantity,
    UnitPrice,
}

/// Editable text fields of the memo header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    CustomerName,
    CustomerAddress,
    CustomerPhone,
}

/// One user action against the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddRow,
    RemoveRow(usize),
    EditItem {
        index: usize,
        field: ItemField,
        value: String,
    },
    EditHeader {
        field: HeaderField,
        value: String,
    },
    SetDate(NaiveDate),
    Reset {
        confirmed: bool,
        today: NaiveDate,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Declined,
}

#[derive(Debug, Clone)]
pub struct InvoiceForm {
    header: MemoHeader,
    items: Vec<LineItem>,
    grand_total: f64,
}

impl InvoiceForm {
    /// A fresh form: one default row dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        let mut form = Self {
            header: MemoHeader::new(today),
            items: vec![LineItem::new(1)],
            grand_total: 0.0,
        };
        form.recalculate_row(0);
        form.recalculate_grand_total();
        form
    }

    pub fn header(&self) -> &MemoHeader {
        &self.header
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, FormError> {
        match command {
            Command::AddRow => {
                self.add_row();
                Ok(Outcome::Updated)
            }
            Command::RemoveRow(index) => {
                self.remove_row(index)?;
                Ok(Outcome::Updated)
            }
            Command::EditItem { index, field, value } => {
                self.edit_item(index, field, value)?;
                Ok(Outcome::Updated)
            }
            Command::EditHeader { field, value } => {
                self.edit_header(field, value);
                Ok(Outcome::Updated)
            }
            Command::SetDate(date) => {
                self.header.date = date;
                Ok(Outcome::Updated)
            }
            Command::Reset { confirmed, today } => Ok(self.reset_form(confirmed, today)),
        }
    }

    /// Append a default row and return its index.
    pub fn add_row(&mut self) -> usize {
        let serial = self.items.len() as u32 + 1;
        self.items.push(LineItem::new(serial));

        let index = self.items.len() - 1;
        self.recalculate_row(index);
        self.recalculate_grand_total();

        debug!(serial, rows = self.items.len(), "line item added");
        index
    }

    /// Remove the row at `index`, keeping at least one row in the form.
    pub fn remove_row(&mut self, index: usize) -> Result<(), FormError> {
        if self.items.len() <= 1 {
            return Err(FormError::LastRow);
        }
        if index >= self.items.len() {
            return Err(FormError::NoSuchRow(index));
        }

        self.items.remove(index);
        self.renumber();
        self.recalculate_grand_total();

        debug!(index, rows = self.items.len(), "line item removed");
        Ok(())
    }

    /// Recompute one row's total from its quantity and unit price.
    /// Unreadable input counts as 0.
    pub fn recalculate_row(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            let quantity = parse_amount(&item.quantity);
            let unit_price = parse_amount(&item.unit_price);
            item.row_total = settle_amount(quantity * unit_price);
        }
    }

    /// Recompute the grand total from the already-rounded row totals.
    pub fn recalculate_grand_total(&mut self) {
        let sum: f64 = self.items.iter().map(|item| item.row_total).sum();
        self.grand_total = settle_amount(sum);
    }

    pub fn edit_item(&mut self, index: usize, field: ItemField, value: String) -> Result<(), FormError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(FormError::NoSuchRow(index))?;

        match field {
            ItemField::Serial => {
                // Keep the old serial when the input is not a positive integer
                if let Ok(serial) = value.trim().parse::<u32>() {
                    if serial > 0 {
                        item.serial = serial;
                    }
                }
            }
            ItemField::Description => item.description = value,
            ItemField::Quantity => {
                item.quantity = value;
                self.recalculate_row(index);
                self.recalculate_grand_total();
            }
            ItemField::UnitPrice => {
                item.unit_price = value;
                self.recalculate_row(index);
                self.recalculate_grand_total();
            }
        }

        Ok(())
    }

    pub fn edit_header(&mut self, field: HeaderField, value: String) {
        match field {
            HeaderField::CustomerName => self.header.customer_name = value,
            HeaderField::CustomerAddress => self.header.customer_address = value,
            HeaderField::CustomerPhone => self.header.customer_phone = value,
        }
    }

    /// Clear the memo back to a single default row. Does nothing unless the
    /// user confirmed.
    pub fn reset_form(&mut self, confirmed: bool, today: NaiveDate) -> Outcome {
        if !confirmed {
            return Outcome::Declined;
        }

        self.header = MemoHeader::new(today);
        self.items.truncate(1);
        self.items[0] = LineItem::new(1);
        self.recalculate_row(0);
        self.recalculate_grand_total();

        info!("memo form reset");
        Outcome::Updated
    }

    fn renumber(&mut self) {
        for (position, item) in self.items.iter_mut().enumerate() {
            item.serial = position as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn serials(form: &InvoiceForm) -> Vec<u32> {
        form.items().iter().map(|item| item.serial).collect()
    }

    fn set(form: &mut InvoiceForm, index: usize, field: ItemField, value: &str) {
        form.apply(Command::EditItem {
            index,
            field,
            value: value.to_string(),
        })
        .unwrap();
    }

    #[test]
    fn new_form_has_one_default_row() {
        let form = InvoiceForm::new(day());

        assert_eq!(form.len(), 1);
        let item = &form.items()[0];
        assert_eq!(item.serial, 1);
        assert_eq!(item.description, "Cockroach Pest");
        assert_eq!(item.quantity, "1");
        assert_eq!(item.unit_price, "135");
        assert_eq!(item.row_total(), 135.0);
        assert_eq!(form.grand_total(), 135.0);
        assert_eq!(form.header().date, day());
    }

    #[test]
    fn add_then_remove_then_reject_last() {
        let mut form = InvoiceForm::new(day());

        form.apply(Command::AddRow).unwrap();
        assert_eq!(format_amount(form.grand_total()), "270.00");
        assert_eq!(serials(&form), vec![1, 2]);

        form.apply(Command::RemoveRow(0)).unwrap();
        assert_eq!(format_amount(form.grand_total()), "135.00");
        assert_eq!(serials(&form), vec![1]);

        let err = form.apply(Command::RemoveRow(0)).unwrap_err();
        assert_eq!(err, FormError::LastRow);
        assert_eq!(err.to_string(), "You need at least one item in the invoice.");
        assert_eq!(form.len(), 1);
        assert_eq!(format_amount(form.grand_total()), "135.00");
    }

    #[test]
    fn row_total_is_rounded_product() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Quantity, "2.5");
        set(&mut form, 0, ItemField::UnitPrice, "3.333");

        assert_eq!(form.items()[0].row_total(), 8.33);
        assert_eq!(form.grand_total(), 8.33);
    }

    #[test]
    fn unreadable_inputs_count_as_zero() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Quantity, "");
        assert_eq!(form.items()[0].row_total(), 0.0);

        set(&mut form, 0, ItemField::Quantity, "3");
        set(&mut form, 0, ItemField::UnitPrice, "abc");
        assert_eq!(form.items()[0].row_total(), 0.0);
        assert_eq!(form.grand_total(), 0.0);
    }

    #[test]
    fn grand_total_sums_rounded_rows() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::UnitPrice, "0.005");
        form.add_row();
        set(&mut form, 1, ItemField::UnitPrice, "0.005");

        // each row displays 0.01, so the total must too
        assert_eq!(form.items()[0].row_total(), 0.01);
        assert_eq!(form.items()[1].row_total(), 0.01);
        assert_eq!(form.grand_total(), 0.02);
    }

    #[test]
    fn huge_row_stays_in_the_grand_total() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Quantity, "1e307");
        set(&mut form, 0, ItemField::UnitPrice, "1");

        assert_eq!(form.items()[0].row_total(), 1e307);
        assert_eq!(form.grand_total(), 1e307);
    }

    #[test]
    fn overflowing_product_counts_as_zero_in_both_totals() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Quantity, "1e200");
        set(&mut form, 0, ItemField::UnitPrice, "1e200");
        assert_eq!(format_amount(form.items()[0].row_total()), "0.00");
        assert_eq!(format_amount(form.grand_total()), "0.00");

        form.add_row();
        let displayed: f64 = form.items().iter().map(|item| item.row_total()).sum();
        assert_eq!(form.grand_total(), amount::round2(displayed));
        assert_eq!(format_amount(form.grand_total()), "135.00");
    }

    #[test]
    fn zero_total_never_displays_negative() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Quantity, "-0");

        assert_eq!(format_amount(form.items()[0].row_total()), "0.00");
        assert_eq!(format_amount(form.grand_total()), "0.00");
    }

    #[test]
    fn removal_renumbers_contiguously() {
        let mut form = InvoiceForm::new(day());
        for _ in 0..4 {
            form.add_row();
        }
        set(&mut form, 2, ItemField::Quantity, "3");
        assert_eq!(form.grand_total(), 135.0 * 7.0);

        form.remove_row(1).unwrap();
        assert_eq!(serials(&form), vec![1, 2, 3, 4]);
        form.remove_row(3).unwrap();
        assert_eq!(serials(&form), vec![1, 2, 3]);
        assert_eq!(form.items()[1].quantity, "3");
        assert_eq!(form.grand_total(), 135.0 * 5.0);
    }

    #[test]
    fn removal_out_of_range_changes_nothing() {
        let mut form = InvoiceForm::new(day());
        form.add_row();

        assert_eq!(form.remove_row(5), Err(FormError::NoSuchRow(5)));
        assert_eq!(form.len(), 2);
        assert_eq!(form.grand_total(), 270.0);
    }

    #[test]
    fn serial_edits_ignore_non_positive_input() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Serial, "7");
        assert_eq!(form.items()[0].serial, 7);

        set(&mut form, 0, ItemField::Serial, "zero");
        set(&mut form, 0, ItemField::Serial, "0");
        assert_eq!(form.items()[0].serial, 7);

        form.add_row();
        form.remove_row(1).unwrap();
        assert_eq!(serials(&form), vec![1]);
    }

    #[test]
    fn editing_a_missing_row_fails() {
        let mut form = InvoiceForm::new(day());
        let result = form.apply(Command::EditItem {
            index: 3,
            field: ItemField::Quantity,
            value: "2".to_string(),
        });
        assert_eq!(result, Err(FormError::NoSuchRow(3)));
    }

    #[test]
    fn confirmed_reset_restores_defaults() {
        let mut form = InvoiceForm::new(day());
        form.edit_header(HeaderField::CustomerName, "Asha Menon".to_string());
        form.add_row();
        form.add_row();
        set(&mut form, 0, ItemField::Quantity, "4");
        set(&mut form, 0, ItemField::UnitPrice, "99.99");
        set(&mut form, 0, ItemField::Description, "Termite Treatment");

        let later = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let outcome = form
            .apply(Command::Reset {
                confirmed: true,
                today: later,
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(form.len(), 1);
        let item = &form.items()[0];
        assert_eq!(item.serial, 1);
        assert_eq!(item.quantity, "1");
        assert_eq!(item.unit_price, "135");
        assert_eq!(item.description, "Cockroach Pest");
        assert_eq!(format_amount(item.row_total()), "135.00");
        assert_eq!(format_amount(form.grand_total()), "135.00");
        assert_eq!(form.header().customer_name, "");
        assert_eq!(form.header().date, later);
    }

    #[test]
    fn declined_reset_is_a_no_op() {
        let mut form = InvoiceForm::new(day());
        form.add_row();
        form.edit_header(HeaderField::CustomerPhone, "555-0101".to_string());

        let outcome = form
            .apply(Command::Reset {
                confirmed: false,
                today: day(),
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(form.len(), 2);
        assert_eq!(form.grand_total(), 270.0);
        assert_eq!(form.header().customer_phone, "555-0101");
    }

    #[test]
    fn description_edit_leaves_totals_alone() {
        let mut form = InvoiceForm::new(day());
        set(&mut form, 0, ItemField::Description, "Bed Bug Spray");

        assert_eq!(form.items()[0].description, "Bed Bug Spray");
        assert_eq!(form.grand_total(), 135.0);
    }

    #[test]
    fn set_date_updates_header() {
        let mut form = InvoiceForm::new(day());
        let other = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        form.apply(Command::SetDate(other)).unwrap();
        assert_eq!(form.header().date, other);
    }
}
