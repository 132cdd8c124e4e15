pub mod plots;
pub mod utils;
pub mod writer;

pub use writer::{generate_report, ReportArtifacts, ReportOptions};
