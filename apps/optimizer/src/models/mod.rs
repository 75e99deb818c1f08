pub mod optimization;
pub mod resume;
