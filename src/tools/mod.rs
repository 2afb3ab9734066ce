// Modular tools
pub mod batch;
