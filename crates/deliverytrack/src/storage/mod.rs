//! Storage layer for deliverytrack.
//!
//! [`DeliveryStore`] persists one row per delivery in `SQLite`. Creation
//! inserts the intake section under a freshly generated identifier; every
//! later write replaces exactly one section and stamps only that section.
//! Several station processes may share one database file; `SQLite`'s lock
//! (with the configured busy timeout) serializes their writes.

pub mod migrations;
pub mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identifier::{DeliveryId, IdGenerator, TimestampIdGenerator};
use crate::record::{
    DeliveryRecord, IntakeDetails, Section, SectionDetails, SectionKind, SectionUpdate,
};

const MEMORY_PATH: &str = ":memory:";

/// Persistent store of delivery records.
#[derive(Debug)]
pub struct DeliveryStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Source of identifiers for new deliveries.
    ids: Box<dyn IdGenerator>,
    /// Identifiers tried per `create` before reporting a collision.
    max_attempts: u32,
}

impl DeliveryStore {
    /// Open or create a delivery database at the given path with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_at(path.as_ref().to_path_buf(), &Config::default())
    }

    /// Open the database described by the configuration.
    ///
    /// Identifier prefix, random bound, retry limit and busy timeout all come
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the configuration is invalid,
    /// or an error if the database cannot be opened or schema initialization fails.
    pub fn open_with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open_at(config.database_path(), config)
    }

    fn open_at(path: PathBuf, config: &Config) -> Result<Self> {
        let ids = TimestampIdGenerator::from_config(&config.identifier)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening delivery database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(config.busy_timeout())?;
        // WAL lets stations read while another one writes; FULL makes every
        // acknowledged section write durable.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Delivery database ready at {}", path.display());
        Ok(Self::with_parts(path, conn, ids, config))
    }

    /// Create an in-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self::with_parts(
            PathBuf::from(MEMORY_PATH),
            conn,
            TimestampIdGenerator::default(),
            &Config::default(),
        ))
    }

    fn with_parts(
        path: PathBuf,
        conn: Connection,
        ids: TimestampIdGenerator,
        config: &Config,
    ) -> Self {
        Self {
            path,
            conn,
            ids: Box::new(ids),
            max_attempts: config.identifier.max_attempts.max(1),
        }
    }

    /// Replace the identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Set how many identifiers `create` tries before giving up (at least one).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Change how long a write waits on another process's lock.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a delivery from its intake section.
    ///
    /// The record starts with only `intake` populated; `createdAt` and the
    /// intake stamp are the same instant. An identifier collision is retried
    /// with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the intake is invalid (nothing is
    /// written), [`Error::DuplicateIdentifier`] if every attempt collided, or
    /// a database error.
    pub fn create(&self, intake: IntakeDetails) -> Result<DeliveryId> {
        intake.validate()?;
        let intake_json = serde_json::to_string(&intake)?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            let id = self.ids.generate();
            let stamp = format_timestamp(now());

            match self.conn.execute(
                schema::INSERT_DELIVERY,
                params![id.as_str(), stamp, intake_json],
            ) {
                Ok(_) => {
                    info!(id = %id, attempts, "Created delivery");
                    return Ok(id);
                }
                Err(err) if is_duplicate_key(&err) => {
                    if attempts >= self.max_attempts {
                        warn!(id = %id, attempts, "Giving up on identifier collisions");
                        return Err(Error::DuplicateIdentifier {
                            id: id.into(),
                            attempts,
                        });
                    }
                    warn!(id = %id, attempt = attempts, "Identifier collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Get a delivery by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no delivery has this id, or a database
    /// or decoding error.
    pub fn get(&self, id: &DeliveryId) -> Result<DeliveryRecord> {
        self.find(id)?.ok_or_else(|| Error::not_found(id.as_str()))
    }

    /// Get a delivery by id, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored row
    /// cannot be decoded.
    pub fn find(&self, id: &DeliveryId) -> Result<Option<DeliveryRecord>> {
        load(&self.conn, id)
    }

    /// Replace one section of an existing delivery.
    ///
    /// The section is overwritten wholesale and stamped with the current time
    /// (never earlier than its previous stamp). Other sections, `id` and
    /// `createdAt` are untouched. Returns the record as it stands after the
    /// write.
    ///
    /// The write is committed before the record is read back, so a section
    /// that fails to decode elsewhere in the row cannot undo it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the update is invalid and
    /// [`Error::NotFound`] if the delivery does not exist; in both cases
    /// nothing is written. Returns [`Error::CorruptRecord`] if the write
    /// succeeded but the stored record cannot be decoded.
    pub fn update_section(&self, id: &DeliveryId, update: SectionUpdate) -> Result<DeliveryRecord> {
        update.validate()?;
        let kind = update.kind();
        let details = update.details_json()?;
        let stamp = format_timestamp(now());

        let changed = self.conn.execute(
            schema::update_section_sql(kind),
            params![id.as_str(), details, stamp],
        )?;
        if changed == 0 {
            debug!(id = %id, section = %kind, "Update for unknown delivery");
            return Err(Error::not_found(id.as_str()));
        }
        info!(id = %id, section = %kind, "Section updated");

        load(&self.conn, id)?
            .ok_or_else(|| Error::internal(format!("delivery {id} vanished after update")))
    }

    /// Check whether a delivery exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn exists(&self, id: &DeliveryId) -> Result<bool> {
        let exists: bool = self
            .conn
            .query_row(schema::SELECT_EXISTS, [id.as_str()], |row| row.get(0))?;
        Ok(exists)
    }

    /// The most recently created deliveries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row cannot be decoded.
    pub fn recent(&self, limit: usize) -> Result<Vec<DeliveryRecord>> {
        let mut stmt = self.conn.prepare(schema::SELECT_RECENT)?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit_i64], StoredRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::decode).collect()
    }

    /// Count stored deliveries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deliveries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let (counts, oldest, newest) = self.conn.query_row(schema::SELECT_STATS, [], |row| {
            let counts: [i64; 5] = [
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ];
            let oldest: Option<String> = row.get(5)?;
            let newest: Option<String> = row.get(6)?;
            Ok((counts, oldest, newest))
        })?;

        let sections_populated = SectionKind::ALL.into_iter().zip(counts).collect();

        let parse = |value: Option<String>| {
            value
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            total_deliveries: counts[0],
            sections_populated,
            oldest_delivery: parse(oldest),
            newest_delivery: parse(newest),
            db_size_bytes,
        })
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Total number of deliveries.
    pub total_deliveries: i64,
    /// How many deliveries have each section written.
    pub sections_populated: BTreeMap<SectionKind, i64>,
    /// Creation time of the oldest delivery.
    pub oldest_delivery: Option<DateTime<Utc>>,
    /// Creation time of the newest delivery.
    pub newest_delivery: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Current time at the precision stamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339, so text order in `SQLite` is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn load(conn: &Connection, id: &DeliveryId) -> Result<Option<DeliveryRecord>> {
    conn.query_row(schema::SELECT_DELIVERY, [id.as_str()], StoredRow::from_row)
        .optional()?
        .map(StoredRow::decode)
        .transpose()
}

/// A `deliveries` row before its JSON columns are decoded.
struct StoredRow {
    id: String,
    created_at: String,
    intake: String,
    intake_updated_at: String,
    // (json, updated_at) for warehouse, quality, logistics, finance
    sections: [(Option<String>, Option<String>); 4],
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            intake: row.get(2)?,
            intake_updated_at: row.get(3)?,
            sections: [
                (row.get(4)?, row.get(5)?),
                (row.get(6)?, row.get(7)?),
                (row.get(8)?, row.get(9)?),
                (row.get(10)?, row.get(11)?),
            ],
        })
    }

    fn decode(self) -> Result<DeliveryRecord> {
        let id = self.id;
        let [warehouse, quality, logistics, finance] = self.sections;

        let created_at = parse_timestamp(&id, "createdAt", &self.created_at)?;
        let intake = Section::new(
            parse_details::<IntakeDetails>(&id, &self.intake)?,
            parse_timestamp(&id, "intake lastUpdated", &self.intake_updated_at)?,
        );

        Ok(DeliveryRecord {
            created_at,
            intake,
            warehouse: decode_section(&id, warehouse)?,
            quality: decode_section(&id, quality)?,
            logistics: decode_section(&id, logistics)?,
            finance: decode_section(&id, finance)?,
            id: DeliveryId::from_stored(id),
        })
    }
}

fn decode_section<T: SectionDetails>(
    id: &str,
    (json, stamp): (Option<String>, Option<String>),
) -> Result<Option<Section<T>>> {
    match (json, stamp) {
        (Some(json), Some(stamp)) => {
            let details = parse_details::<T>(id, &json)?;
            let field = format!("{} lastUpdated", T::KIND.field_name());
            Ok(Some(Section::new(details, parse_timestamp(id, &field, &stamp)?)))
        }
        (None, None) => Ok(None),
        _ => Err(Error::corrupt_record(
            id,
            format!(
                "{} section and its timestamp disagree",
                T::KIND.field_name()
            ),
        )),
    }
}

fn parse_details<T: SectionDetails>(id: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|err| {
        Error::corrupt_record(id, format!("{} section: {err}", T::KIND.field_name()))
    })
}

fn parse_timestamp(id: &str, field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| Error::corrupt_record(id, format!("{field} '{value}': {err}")))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::logging::init_test_logging;
    use crate::record::{
        FinanceDetails, MaterialType, PaymentStatus, QualityDetails, QualityStatus,
        WarehouseDetails,
    };

    /// Hands out a fixed list of identifiers, then repeats the last one.
    #[derive(Debug)]
    struct SequenceIds(Mutex<VecDeque<&'static str>>);

    impl SequenceIds {
        fn new(ids: &[&'static str]) -> Self {
            Self(Mutex::new(ids.iter().copied().collect()))
        }
    }

    impl IdGenerator for SequenceIds {
        fn generate(&self) -> DeliveryId {
            let mut queue = self.0.lock().unwrap();
            let next = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                *queue.front().unwrap()
            };
            DeliveryId::parse(next).unwrap()
        }
    }

    fn create_test_store() -> DeliveryStore {
        init_test_logging();
        DeliveryStore::open_in_memory().expect("failed to create test store")
    }

    fn acme_cement() -> IntakeDetails {
        IntakeDetails {
            supplier: Some("Acme".to_string()),
            ..IntakeDetails::new(MaterialType::Cement, 50.0)
        }
    }

    fn paid_5000() -> FinanceDetails {
        FinanceDetails {
            amount: Some(5000.0),
            payment_status: Some(PaymentStatus::Paid),
            ..FinanceDetails::default()
        }
    }

    fn quality(status: QualityStatus) -> SectionUpdate {
        QualityDetails {
            quality_status: Some(status),
            ..QualityDetails::default()
        }
        .into()
    }

    #[test]
    fn test_open_in_memory() {
        let store = DeliveryStore::open_in_memory().unwrap();
        assert_eq!(store.path(), Path::new(":memory:"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_create_then_get_has_only_intake() {
        let store = create_test_store();
        let before = Utc::now().trunc_subsecs(6);

        let id = store.create(acme_cement()).unwrap();
        let record = store.get(&id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.intake.details, acme_cement());
        assert_eq!(record.intake.last_updated, record.created_at);
        assert!(record.created_at >= before);
        assert!(record.warehouse.is_none());
        assert!(record.quality.is_none());
        assert!(record.logistics.is_none());
        assert!(record.finance.is_none());
    }

    #[test]
    fn test_generated_ids_use_default_prefix() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        assert!(id.as_str().starts_with("DEL-"));
    }

    #[test]
    fn test_create_rejects_invalid_intake() {
        let store = create_test_store();
        let err = store
            .create(IntakeDetails::new(MaterialType::Sand, -1.0))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_cement_then_finance_scenario() {
        let store = create_test_store();
        let intake = SectionUpdate::from_json(
            SectionKind::Intake,
            json!({"materialType": "cement", "quantity": 50, "supplier": "Acme"}),
        )
        .unwrap();
        let SectionUpdate::Intake(intake) = intake else {
            panic!("expected an intake update");
        };

        let id = store.create(intake).unwrap();
        let finance = SectionUpdate::from_json(
            SectionKind::Finance,
            json!({"amount": 5000, "paymentStatus": "paid"}),
        )
        .unwrap();
        store.update_section(&id, finance).unwrap();

        let record = store.get(&id).unwrap();
        assert!((record.intake.details.quantity - 50.0).abs() < f64::EPSILON);
        assert_eq!(record.finance.as_ref().unwrap().details, paid_5000());
        assert!(record.warehouse.is_none());
    }

    #[test]
    fn test_update_leaves_other_sections_alone() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        store
            .update_section(
                &id,
                WarehouseDetails {
                    bin_number: Some("B-7".to_string()),
                    ..WarehouseDetails::default()
                }
                .into(),
            )
            .unwrap();
        let before = store.get(&id).unwrap();

        let call_time = Utc::now().trunc_subsecs(6);
        let after = store.update_section(&id, paid_5000().into()).unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.intake, before.intake);
        assert_eq!(after.warehouse, before.warehouse);
        assert_eq!(after.quality, before.quality);
        assert_eq!(after.logistics, before.logistics);
        let finance = after.finance.as_ref().unwrap();
        assert_eq!(finance.details, paid_5000());
        assert!(finance.last_updated >= call_time);
        assert_eq!(store.get(&id).unwrap(), after);
    }

    #[test]
    fn test_last_write_wins() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();

        store
            .update_section(&id, quality(QualityStatus::Pending))
            .unwrap();
        store
            .update_section(&id, quality(QualityStatus::Passed))
            .unwrap();

        let record = store.get(&id).unwrap();
        let section = record.quality.unwrap();
        assert_eq!(section.details.quality_status, Some(QualityStatus::Passed));
        assert_eq!(section.details.remarks, None);
    }

    #[test]
    fn test_replace_drops_omitted_fields() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();

        store
            .update_section(
                &id,
                QualityDetails {
                    remarks: Some("cracked bags".to_string()),
                    quality_status: Some(QualityStatus::Failed),
                    ..QualityDetails::default()
                }
                .into(),
            )
            .unwrap();
        let record = store
            .update_section(&id, quality(QualityStatus::Passed))
            .unwrap();

        assert_eq!(record.quality.unwrap().details.remarks, None);
    }

    #[test]
    fn test_identical_updates_only_advance_stamp() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();

        let first = store.update_section(&id, paid_5000().into()).unwrap();
        let second = store.update_section(&id, paid_5000().into()).unwrap();

        let (a, b) = (first.finance.unwrap(), second.finance.unwrap());
        assert_eq!(a.details, b.details);
        assert!(b.last_updated >= a.last_updated);
    }

    #[test]
    fn test_stamp_never_moves_backwards() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        store.update_section(&id, paid_5000().into()).unwrap();

        // Simulate a stamp written by a station whose clock ran ahead.
        store
            .conn
            .execute(
                "UPDATE deliveries SET finance_updated_at = '2999-01-01T00:00:00.000000Z' WHERE id = ?1",
                [id.as_str()],
            )
            .unwrap();

        let record = store
            .update_section(
                &id,
                FinanceDetails {
                    amount: Some(1.0),
                    ..FinanceDetails::default()
                }
                .into(),
            )
            .unwrap();
        let finance = record.finance.unwrap();
        assert_eq!(finance.details.amount, Some(1.0));
        assert_eq!(finance.last_updated.to_rfc3339(), "2999-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let store = create_test_store();
        let id = DeliveryId::parse("DEL-0-0").unwrap();

        assert!(store.get(&id).unwrap_err().is_not_found());
        assert!(store.find(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn test_update_unknown_is_not_found_and_creates_nothing() {
        let store = create_test_store();
        let id = DeliveryId::parse("DEL-0-0").unwrap();

        let err = store.update_section(&id, paid_5000().into()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count().unwrap(), 0);
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn test_rejected_update_keeps_prior_section() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        let before = store.update_section(&id, paid_5000().into()).unwrap();

        let invalid = FinanceDetails {
            amount: Some(-10.0),
            ..FinanceDetails::default()
        };
        let err = store.update_section(&id, invalid.into()).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(store.get(&id).unwrap(), before);
    }

    #[test]
    fn test_collision_is_retried() {
        let store = create_test_store().with_id_generator(SequenceIds::new(&[
            "DEL-1-1", "DEL-1-1", "DEL-1-2",
        ]));

        let first = store.create(acme_cement()).unwrap();
        let second = store.create(acme_cement()).unwrap();

        assert_eq!(first.as_str(), "DEL-1-1");
        assert_eq!(second.as_str(), "DEL-1-2");
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_always_colliding_generator_gives_up() {
        let store = create_test_store()
            .with_id_generator(SequenceIds::new(&["DEL-7-7"]))
            .with_max_attempts(3);

        let id = store.create(acme_cement()).unwrap();
        let original = store.get(&id).unwrap();

        let err = store
            .create(IntakeDetails::new(MaterialType::Steel, 9.0))
            .unwrap_err();
        match err {
            Error::DuplicateIdentifier { id, attempts } => {
                assert_eq!(id, "DEL-7-7");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(&id).unwrap(), original);
    }

    #[test]
    fn test_intake_can_be_replaced() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();

        let record = store
            .update_section(&id, IntakeDetails::new(MaterialType::Bricks, 1200.0).into())
            .unwrap();

        assert_eq!(record.intake.details.material_type, MaterialType::Bricks);
        assert_eq!(record.intake.details.supplier, None);
        assert!(record.intake.last_updated >= record.created_at);
    }

    #[test]
    fn test_recent_newest_first() {
        let store = create_test_store().with_id_generator(SequenceIds::new(&[
            "DEL-1-1", "DEL-2-2", "DEL-3-3",
        ]));
        for _ in 0..3 {
            store.create(acme_cement()).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);
        assert_eq!(store.recent(10).unwrap().len(), 3);
    }

    #[test]
    fn test_stats() {
        let store = create_test_store();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_deliveries, 0);
        assert!(empty.oldest_delivery.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        let a = store.create(acme_cement()).unwrap();
        store.create(acme_cement()).unwrap();
        store.update_section(&a, paid_5000().into()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_deliveries, 2);
        assert_eq!(stats.sections_populated[&SectionKind::Intake], 2);
        assert_eq!(stats.sections_populated[&SectionKind::Finance], 1);
        assert_eq!(stats.sections_populated[&SectionKind::Warehouse], 0);
        assert!(stats.oldest_delivery <= stats.newest_delivery);
    }

    #[test]
    fn test_corrupt_section_is_reported() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        store
            .conn
            .execute(
                "UPDATE deliveries SET quality = '{\"qualityStatus\":\"maybe\"}', quality_updated_at = '2024-01-01T00:00:00.000000Z' WHERE id = ?1",
                [id.as_str()],
            )
            .unwrap();

        let err = store.get(&id).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { .. }));
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deliveries.db");

        let id = {
            let store = DeliveryStore::open(&path).unwrap();
            let id = store.create(acme_cement()).unwrap();
            store.update_section(&id, paid_5000().into()).unwrap();
            id
        };

        let reopened = DeliveryStore::open(&path).unwrap();
        let record = reopened.get(&id).unwrap();
        assert_eq!(record.finance.unwrap().details, paid_5000());
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_two_connections_see_each_others_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let onsite = DeliveryStore::open(&path).unwrap();
        let finance = DeliveryStore::open(&path).unwrap();

        let id = onsite.create(acme_cement()).unwrap();
        finance.update_section(&id, paid_5000().into()).unwrap();
        onsite
            .update_section(&id, quality(QualityStatus::Passed))
            .unwrap();

        let record = finance.get(&id).unwrap();
        assert_eq!(record.finance.unwrap().details, paid_5000());
        assert_eq!(
            record.quality.unwrap().details.quality_status,
            Some(QualityStatus::Passed)
        );
    }

    #[test]
    fn test_open_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("site.db"));
        config.identifier.prefix = "SITE".to_string();

        let store = DeliveryStore::open_with_config(&config).unwrap();
        let id = store.create(acme_cement()).unwrap();

        assert!(id.as_str().starts_with("SITE-"));
        assert_eq!(store.path(), dir.path().join("site.db"));
        store.set_busy_timeout(Duration::from_millis(100)).unwrap();
    }

    #[test]
    fn test_open_with_config_rejects_bad_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for prefix in ["bad prefix", "A B/C"] {
            let mut config = Config::default();
            config.storage.database_path = Some(dir.path().join("bad.db"));
            config.identifier.prefix = prefix.to_string();

            let err = DeliveryStore::open_with_config(&config).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }), "{prefix:?}");
        }
        assert!(!dir.path().join("bad.db").exists());
    }

    #[test]
    fn test_update_survives_corrupt_neighbour_section() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();
        store
            .conn
            .execute(
                "UPDATE deliveries SET quality = '{\"qualityStatus\":\"maybe\"}', \
                 quality_updated_at = '2024-01-01T00:00:00.000000Z' WHERE id = ?1",
                [id.as_str()],
            )
            .unwrap();

        let err = store.update_section(&id, paid_5000().into()).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { .. }));

        let finance: String = store
            .conn
            .query_row(
                "SELECT finance FROM deliveries WHERE id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        let finance: serde_json::Value = serde_json::from_str(&finance).unwrap();
        assert_eq!(finance["paymentStatus"], "paid");
    }

    #[test]
    fn test_each_section_update_leaves_the_others_alone() {
        let store = create_test_store();
        let id = store.create(acme_cement()).unwrap();

        let samples = |round: u32| -> Vec<SectionUpdate> {
            SectionKind::ALL
                .iter()
                .map(|kind| {
                    let body = match kind {
                        SectionKind::Intake => json!({
                            "materialType": "steel",
                            "quantity": 10 + round,
                            "supplier": format!("Supplier {round}"),
                        }),
                        SectionKind::Warehouse => json!({
                            "storageLocation": format!("Bay {round}"),
                        }),
                        SectionKind::Quality => json!({
                            "inspectorName": format!("Inspector {round}"),
                        }),
                        SectionKind::Logistics => json!({
                            "carrierName": format!("Carrier {round}"),
                        }),
                        SectionKind::Finance => json!({
                            "invoiceNumber": format!("INV-{round}"),
                        }),
                    };
                    SectionUpdate::from_json(*kind, body).unwrap()
                })
                .collect()
        };

        for update in samples(1) {
            store.update_section(&id, update).unwrap();
        }

        for update in samples(2) {
            let kind = update.kind();
            let before = store.get(&id).unwrap();
            let after = store.update_section(&id, update).unwrap();

            assert_eq!(after.created_at, before.created_at);
            for other in SectionKind::ALL.iter().filter(|other| **other != kind) {
                assert_eq!(
                    after.section_json(*other).unwrap(),
                    before.section_json(*other).unwrap(),
                    "writing {kind} changed {other}"
                );
            }
            assert_ne!(
                after.section_json(kind).unwrap(),
                before.section_json(kind).unwrap()
            );
        }
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(ts), "2024-05-01T08:00:00.000000Z");
    }
}
