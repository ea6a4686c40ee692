pub mod charts;
pub mod interpret;
pub mod report;
pub mod stats;
pub mod table_loader;
