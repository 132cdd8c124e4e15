pub mod eda;
pub mod loader;
pub mod report;
