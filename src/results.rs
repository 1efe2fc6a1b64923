mod command_tag;
mod scan;

pub use command_tag::CommandTag;
pub use scan::{ScanTarget, scan_into};
