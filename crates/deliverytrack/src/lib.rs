//! `deliverytrack` - one delivery record, five handling stations
//!
//! A delivery is created at on-site intake under a generated identifier and
//! then annotated by the warehouse, quality, logistics and finance stations.
//! Each station reads the whole record but replaces only its own section;
//! the last write to a section wins.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod record;
pub mod scan;
pub mod station;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use identifier::{DeliveryId, IdGenerator, TimestampIdGenerator};
pub use logging::init_logging;
pub use record::{DeliveryRecord, IntakeDetails, Section, SectionKind, SectionUpdate};
pub use scan::ScanTarget;
pub use station::Station;
pub use storage::{DeliveryStore, StoreStats};
