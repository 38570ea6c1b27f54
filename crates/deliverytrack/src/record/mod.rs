//! Delivery record types.
//!
//! A [`DeliveryRecord`] is created once with its intake section and then
//! annotated by the other stations. Every section is replaced wholesale by a
//! [`SectionUpdate`]; no section write ever touches another section.

mod details;
mod form;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::DeliveryId;

pub use details::{
    FinanceDetails, IntakeDetails, LogisticsDetails, MaterialType, PaymentMethod, PaymentStatus,
    QualityDetails, QualityStatus, StorageCondition, TransportMode, WarehouseDetails,
};

/// Key the store stamps on every section; ignored when submitted.
pub const LAST_UPDATED_KEY: &str = "lastUpdated";

/// The five sections of a delivery record, one per station.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// On-site intake, written when the delivery arrives.
    #[serde(rename = "onsite", alias = "intake")]
    Intake,
    /// Warehouse storage.
    Warehouse,
    /// Quality inspection.
    Quality,
    /// Logistics and transport.
    Logistics,
    /// Finance and payment.
    Finance,
}

impl SectionKind {
    /// All sections, in station order.
    pub const ALL: [Self; 5] = [
        Self::Intake,
        Self::Warehouse,
        Self::Quality,
        Self::Logistics,
        Self::Finance,
    ];

    /// Wire name used in routes and update requests.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "onsite",
            Self::Warehouse => "warehouse",
            Self::Quality => "quality",
            Self::Logistics => "logistics",
            Self::Finance => "finance",
        }
    }

    /// Name of the section field on the record.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            other => other.as_str(),
        }
    }

    /// Human-readable station name.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Intake => "On-Site",
            Self::Warehouse => "Warehouse",
            Self::Quality => "Quality Check",
            Self::Logistics => "Logistics",
            Self::Finance => "Finance",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onsite" | "on-site" | "intake" => Ok(Self::Intake),
            "warehouse" => Ok(Self::Warehouse),
            "quality" => Ok(Self::Quality),
            "logistics" => Ok(Self::Logistics),
            "finance" => Ok(Self::Finance),
            _ => Err(Error::UnknownSection {
                name: s.to_string(),
            }),
        }
    }
}

/// Field schema of one section.
pub trait SectionDetails:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync
{
    /// The section this schema belongs to.
    const KIND: SectionKind;

    /// Check constraints serde cannot express (ranges, finiteness).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violated constraint.
    fn validate(&self) -> Result<()>;
}

/// A populated section: the station's fields plus the store's write stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    /// The fields the station submitted.
    #[serde(flatten)]
    pub details: T,
    /// When this section was last written.
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl<T> Section<T> {
    /// Wrap details with their write stamp.
    #[must_use]
    pub fn new(details: T, last_updated: DateTime<Utc>) -> Self {
        Self {
            details,
            last_updated,
        }
    }
}

/// The single persisted record tracking one physical delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    /// Identifier minted at creation.
    pub id: DeliveryId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// On-site intake section; always present.
    pub intake: Section<IntakeDetails>,
    /// Warehouse section.
    pub warehouse: Option<Section<WarehouseDetails>>,
    /// Quality check section.
    pub quality: Option<Section<QualityDetails>>,
    /// Logistics section.
    pub logistics: Option<Section<LogisticsDetails>>,
    /// Finance section.
    pub finance: Option<Section<FinanceDetails>>,
}

impl DeliveryRecord {
    /// When the given section was last written, if it has been.
    #[must_use]
    pub fn last_updated(&self, kind: SectionKind) -> Option<DateTime<Utc>> {
        match kind {
            SectionKind::Intake => Some(self.intake.last_updated),
            SectionKind::Warehouse => self.warehouse.as_ref().map(|s| s.last_updated),
            SectionKind::Quality => self.quality.as_ref().map(|s| s.last_updated),
            SectionKind::Logistics => self.logistics.as_ref().map(|s| s.last_updated),
            SectionKind::Finance => self.finance.as_ref().map(|s| s.last_updated),
        }
    }

    /// Whether the given section has been written.
    #[must_use]
    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.last_updated(kind).is_some()
    }

    /// Sections written so far, in station order.
    #[must_use]
    pub fn populated_sections(&self) -> Vec<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .filter(|kind| self.has_section(*kind))
            .collect()
    }

    /// One-line description of what was delivered, shown above the other
    /// stations' views.
    ///
    /// Reads like `50 cement (OPC 53) from Acme Corp on 2024-03-18`; the
    /// name, supplier and date parts are left out when not recorded.
    #[must_use]
    pub fn intake_summary(&self) -> String {
        let intake = &self.intake.details;
        let mut summary = format!("{} {}", intake.quantity, intake.material_type);
        if let Some(name) = &intake.material_name {
            summary.push_str(&format!(" ({name})"));
        }
        if let Some(supplier) = &intake.supplier {
            summary.push_str(&format!(" from {supplier}"));
        }
        if let Some(date) = intake.date {
            summary.push_str(&format!(" on {date}"));
        }
        summary
    }

    /// A single section as JSON, `None` if it has not been written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn section_json(&self, kind: SectionKind) -> Result<Option<serde_json::Value>> {
        let value = match kind {
            SectionKind::Intake => Some(serde_json::to_value(&self.intake)?),
            SectionKind::Warehouse => self.warehouse.as_ref().map(serde_json::to_value).transpose()?,
            SectionKind::Quality => self.quality.as_ref().map(serde_json::to_value).transpose()?,
            SectionKind::Logistics => self.logistics.as_ref().map(serde_json::to_value).transpose()?,
            SectionKind::Finance => self.finance.as_ref().map(serde_json::to_value).transpose()?,
        };
        Ok(value)
    }
}

/// A complete replacement for exactly one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    /// Replace the intake section.
    Intake(IntakeDetails),
    /// Replace the warehouse section.
    Warehouse(WarehouseDetails),
    /// Replace the quality section.
    Quality(QualityDetails),
    /// Replace the logistics section.
    Logistics(LogisticsDetails),
    /// Replace the finance section.
    Finance(FinanceDetails),
}

impl SectionUpdate {
    /// Parse a submitted form body for the given section.
    ///
    /// A `lastUpdated` key is dropped; any other key outside the section
    /// schema is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body is not an object, has
    /// unknown or malformed fields, or violates a section constraint.
    pub fn from_json(kind: SectionKind, value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut fields) = value else {
            return Err(Error::validation(kind, "expected a JSON object"));
        };
        fields.remove(LAST_UPDATED_KEY);
        let value = serde_json::Value::Object(fields);

        let update = match kind {
            SectionKind::Intake => Self::Intake(parse_details(value)?),
            SectionKind::Warehouse => Self::Warehouse(parse_details(value)?),
            SectionKind::Quality => Self::Quality(parse_details(value)?),
            SectionKind::Logistics => Self::Logistics(parse_details(value)?),
            SectionKind::Finance => Self::Finance(parse_details(value)?),
        };
        update.validate()?;
        Ok(update)
    }

    /// Parse a submitted form body from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the text is not valid JSON or the
    /// body is rejected by [`SectionUpdate::from_json`].
    pub fn from_json_str(kind: SectionKind, text: &str) -> Result<Self> {
        let value = serde_json::from_str(text).map_err(|err| Error::validation(kind, err.to_string()))?;
        Self::from_json(kind, value)
    }

    /// The section this update replaces.
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Intake(_) => SectionKind::Intake,
            Self::Warehouse(_) => SectionKind::Warehouse,
            Self::Quality(_) => SectionKind::Quality,
            Self::Logistics(_) => SectionKind::Logistics,
            Self::Finance(_) => SectionKind::Finance,
        }
    }

    /// Check the section constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Intake(d) => d.validate(),
            Self::Warehouse(d) => d.validate(),
            Self::Quality(d) => d.validate(),
            Self::Logistics(d) => d.validate(),
            Self::Finance(d) => d.validate(),
        }
    }

    /// Serialize the section fields for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn details_json(&self) -> Result<String> {
        let text = match self {
            Self::Intake(d) => serde_json::to_string(d)?,
            Self::Warehouse(d) => serde_json::to_string(d)?,
            Self::Quality(d) => serde_json::to_string(d)?,
            Self::Logistics(d) => serde_json::to_string(d)?,
            Self::Finance(d) => serde_json::to_string(d)?,
        };
        Ok(text)
    }
}

fn parse_details<T: SectionDetails>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| Error::validation(T::KIND, err.to_string()))
}

impl From<IntakeDetails> for SectionUpdate {
    fn from(details: IntakeDetails) -> Self {
        Self::Intake(details)
    }
}

impl From<WarehouseDetails> for SectionUpdate {
    fn from(details: WarehouseDetails) -> Self {
        Self::Warehouse(details)
    }
}

impl From<QualityDetails> for SectionUpdate {
    fn from(details: QualityDetails) -> Self {
        Self::Quality(details)
    }
}

impl From<LogisticsDetails> for SectionUpdate {
    fn from(details: LogisticsDetails) -> Self {
        Self::Logistics(details)
    }
}

impl From<FinanceDetails> for SectionUpdate {
    fn from(details: FinanceDetails) -> Self {
        Self::Finance(details)
    }
}
