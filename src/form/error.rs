use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("You need at least one item in the invoice.")]
    LastRow,

    #[error("No line item at position {0}")]
    NoSuchRow(usize),
}
