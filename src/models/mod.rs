mod line_item;
mod memo_header;

pub use line_item::LineItem;
pub use memo_header::MemoHeader;
