pub mod content_id;
pub mod json_canonical;
