//! Hour-package usage normalization.

pub mod usage;

pub use usage::{PackageRecord, PackageUsage, PackageUsageExtractor};
