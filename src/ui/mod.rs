pub mod components;
pub mod memo_form;
