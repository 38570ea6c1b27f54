//! Field schemas for the five station sections.
//!
//! Each struct is the complete form a station submits. Unknown keys are
//! rejected; enumerated fields only accept their lower-case wire values.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{form, SectionDetails, SectionKind};
use crate::error::{Error, Result};

/// Kind of material being delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    /// Cement.
    #[default]
    Cement,
    /// Steel.
    Steel,
    /// Bricks.
    Bricks,
    /// Sand.
    Sand,
    /// Anything else.
    Other,
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cement => "cement",
            Self::Steel => "steel",
            Self::Bricks => "bricks",
            Self::Sand => "sand",
            Self::Other => "other",
        };
        f.pad(name)
    }
}

/// How the warehouse stores the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageCondition {
    /// Dry storage.
    Dry,
    /// Refrigerated storage.
    Cold,
    /// Ventilated storage.
    Ventilated,
    /// Hazardous-materials storage.
    Hazardous,
}

/// Outcome of the quality inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    /// Inspection passed.
    Passed,
    /// Inspection failed.
    Failed,
    /// Inspection not concluded yet.
    Pending,
}

/// Transport mode used by logistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Road freight.
    Road,
    /// Rail freight.
    Rail,
    /// Air freight.
    Air,
    /// Sea freight.
    Sea,
}

/// Payment progress recorded by finance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing paid yet.
    Pending,
    /// Partially paid.
    Partial,
    /// Fully paid.
    Paid,
}

/// How the supplier was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Cheque.
    Cheque,
    /// Bank transfer.
    Transfer,
    /// Card.
    Card,
}

/// On-site intake details, captured when the delivery arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntakeDetails {
    /// Kind of material delivered.
    #[serde(deserialize_with = "form::required")]
    pub material_type: MaterialType,
    /// Delivered quantity.
    #[serde(deserialize_with = "form::required")]
    pub quantity: f64,
    /// Name of the material.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    /// Delivery date.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Delivery time of day, as entered.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Registration number of the delivering vehicle.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    /// Chalan (delivery note) number.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub chalan_number: Option<String>,
    /// Supplier name.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    /// Project site receiving the material.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub project_site: Option<String>,
    /// Person who received the delivery.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub receiving_person: Option<String>,
    /// Free-form remarks.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl IntakeDetails {
    /// Create intake details with only the required fields set.
    #[must_use]
    pub fn new(material_type: MaterialType, quantity: f64) -> Self {
        Self {
            material_type,
            quantity,
            ..Self::default()
        }
    }
}

/// Warehouse storage details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WarehouseDetails {
    /// Storage area.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    /// Bin within the storage area.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub bin_number: Option<String>,
    /// Quantity counted into the warehouse.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub received_quantity: Option<f64>,
    /// Required storage condition.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub storage_condition: Option<StorageCondition>,
    /// Handling instructions.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub handling_instructions: Option<String>,
    /// Damage noted on receipt.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub damage_report: Option<String>,
    /// Responsible warehouse manager.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub warehouse_manager: Option<String>,
}

/// Quality inspection details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityDetails {
    /// Test results, as reported.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub test_results: Option<String>,
    /// Inspection outcome.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub quality_status: Option<QualityStatus>,
    /// Inspector name.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub inspector_name: Option<String>,
    /// Inspection date.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<NaiveDate>,
    /// Standard the material was checked against.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub compliance_standard: Option<String>,
    /// Number of samples taken.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u32>,
    /// Free-form remarks.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Logistics and transport details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogisticsDetails {
    /// Transport mode.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
    /// Carrier name.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,
    /// Carrier tracking number.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    /// Expected arrival date.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub estimated_arrival: Option<NaiveDate>,
    /// Actual arrival date.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub actual_arrival: Option<NaiveDate>,
    /// Shipping document references.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub shipping_documents: Option<String>,
    /// Handler contact information.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub handler_information: Option<String>,
}

/// Finance and payment details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinanceDetails {
    /// Invoiced amount.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Payment progress.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    /// Date of payment.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Invoice number.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Tax breakdown.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub tax_details: Option<String>,
    /// Payment method.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    /// Bank details used for the payment.
    #[serde(default, deserialize_with = "form::optional", skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<String>,
}

/// Reject negative or non-finite quantities.
fn check_amount(section: SectionKind, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::validation(
            section,
            format!("{field} must be a finite number"),
        )),
        Some(v) if v < 0.0 => Err(Error::validation(
            section,
            format!("{field} must not be negative"),
        )),
        _ => Ok(()),
    }
}

impl SectionDetails for IntakeDetails {
    const KIND: SectionKind = SectionKind::Intake;

    fn validate(&self) -> Result<()> {
        check_amount(Self::KIND, "quantity", Some(self.quantity))
    }
}

impl SectionDetails for WarehouseDetails {
    const KIND: SectionKind = SectionKind::Warehouse;

    fn validate(&self) -> Result<()> {
        check_amount(Self::KIND, "receivedQuantity", self.received_quantity)
    }
}

impl SectionDetails for QualityDetails {
    const KIND: SectionKind = SectionKind::Quality;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl SectionDetails for LogisticsDetails {
    const KIND: SectionKind = SectionKind::Logistics;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl SectionDetails for FinanceDetails {
    const KIND: SectionKind = SectionKind::Finance;

    fn validate(&self) -> Result<()> {
        check_amount(Self::KIND, "amount", self.amount)
    }
}
