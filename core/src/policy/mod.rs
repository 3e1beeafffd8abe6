pub mod export_gate;
pub mod types;
