pub mod format;

pub use format::{format_phone, is_masked_phone, is_valid_responsible, title_case_name};
