//! `SQLite` schema definitions for deliverytrack.
//!
//! One row per delivery. Every section is a JSON text column with its own
//! `*_updated_at` stamp, so a section write is a single-row UPDATE that
//! cannot reach another section's columns.

use crate::record::SectionKind;

/// SQL statement to create the deliveries table.
pub const CREATE_DELIVERIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS deliveries (
    id TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    intake TEXT NOT NULL,
    intake_updated_at TEXT NOT NULL,
    warehouse TEXT,
    warehouse_updated_at TEXT,
    quality TEXT,
    quality_updated_at TEXT,
    logistics TEXT,
    logistics_updated_at TEXT,
    finance TEXT,
    finance_updated_at TEXT
)
";

/// SQL statement to create an index on `created_at` for recency listings.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_deliveries_created_at ON deliveries(created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DELIVERIES_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_METADATA_TABLE,
];

macro_rules! delivery_columns {
    () => {
        "id, created_at, intake, intake_updated_at, \
         warehouse, warehouse_updated_at, quality, quality_updated_at, \
         logistics, logistics_updated_at, finance, finance_updated_at"
    };
}

/// Insert a new delivery with only its intake section.
///
/// Parameters: `?1` id, `?2` creation stamp (also the intake stamp), `?3` intake JSON.
pub const INSERT_DELIVERY: &str =
    "INSERT INTO deliveries (id, created_at, intake, intake_updated_at) VALUES (?1, ?2, ?3, ?2)";

/// Select one delivery by id.
pub const SELECT_DELIVERY: &str = concat!(
    "SELECT ",
    delivery_columns!(),
    " FROM deliveries WHERE id = ?1"
);

/// Select the most recently created deliveries.
pub const SELECT_RECENT: &str = concat!(
    "SELECT ",
    delivery_columns!(),
    " FROM deliveries ORDER BY created_at DESC, id DESC LIMIT ?1"
);

/// Check whether a delivery exists.
pub const SELECT_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM deliveries WHERE id = ?1)";

/// Totals for the stats report.
pub const SELECT_STATS: &str = r"
SELECT COUNT(*), COUNT(warehouse), COUNT(quality), COUNT(logistics), COUNT(finance),
       MIN(created_at), MAX(created_at)
FROM deliveries
";

// Replaces one section and stamps it, never moving the stamp backwards.
// Parameters: ?1 id, ?2 section JSON, ?3 write stamp.
macro_rules! update_section {
    ($column:literal) => {
        concat!(
            "UPDATE deliveries SET ",
            $column,
            " = ?2, ",
            $column,
            "_updated_at = MAX(?3, COALESCE(",
            $column,
            "_updated_at, ?3)) WHERE id = ?1"
        )
    };
}

const UPDATE_INTAKE: &str = update_section!("intake");
const UPDATE_WAREHOUSE: &str = update_section!("warehouse");
const UPDATE_QUALITY: &str = update_section!("quality");
const UPDATE_LOGISTICS: &str = update_section!("logistics");
const UPDATE_FINANCE: &str = update_section!("finance");

/// The UPDATE statement that replaces the given section.
#[must_use]
pub fn update_section_sql(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Intake => UPDATE_INTAKE,
        SectionKind::Warehouse => UPDATE_WAREHOUSE,
        SectionKind::Quality => UPDATE_QUALITY,
        SectionKind::Logistics => UPDATE_LOGISTICS,
        SectionKind::Finance => UPDATE_FINANCE,
    }
}
