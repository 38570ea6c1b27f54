//! Turning scanned codes into deliveries, and deliveries into scannable links.
//!
//! A QR code printed at intake carries `{"qrCodeId":"<id>"}`. Stations may
//! also scan or paste a station link (`<base>/delivery/<id>[/<section>]`) or
//! type the bare identifier; [`resolve`] accepts all three.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::identifier::DeliveryId;
use crate::record::SectionKind;

/// Path segment that precedes the identifier in station links.
const ROUTE_SEGMENT: &str = "delivery";

/// What a scan points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// The delivery.
    pub id: DeliveryId,
    /// The station page, when the scan was a section link.
    pub section: Option<SectionKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrPayload {
    qr_code_id: String,
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|/)delivery/([^/?#\s]+)(?:/([^/?#\s]+))?/?(?:[?#]\S*)?$")
            .expect("invalid delivery link pattern")
    })
}

/// Resolve a scanned or typed payload.
///
/// # Errors
///
/// Returns [`Error::ScanPayload`] for an empty or unrecognized payload,
/// [`Error::InvalidIdentifier`] for a malformed identifier and
/// [`Error::UnknownSection`] for a link to an unknown station page.
pub fn resolve(payload: &str) -> Result<ScanTarget> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(Error::scan_payload("empty payload"));
    }

    if payload.starts_with('{') {
        let qr: QrPayload = serde_json::from_str(payload)
            .map_err(|err| Error::scan_payload(format!("bad QR payload: {err}")))?;
        return Ok(ScanTarget {
            id: DeliveryId::parse(qr.qr_code_id)?,
            section: None,
        });
    }

    if let Some(captures) = link_pattern().captures(payload) {
        let id = DeliveryId::parse(&captures[1])?;
        let section = captures
            .get(2)
            .map(|m| m.as_str().parse::<SectionKind>())
            .transpose()?;
        return Ok(ScanTarget { id, section });
    }

    if payload.contains("://") {
        return Err(Error::scan_payload(format!(
            "link does not point at a delivery: {payload}"
        )));
    }

    Ok(ScanTarget {
        id: DeliveryId::parse(payload)?,
        section: None,
    })
}

impl ScanTarget {
    /// The section a write through this scan should go to.
    ///
    /// A section link decides the station on its own; an explicitly requested
    /// section must agree with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionMismatch`] if the link and the request name
    /// different sections, and [`Error::ScanPayload`] if neither names one.
    pub fn station_section(&self, requested: Option<SectionKind>) -> Result<SectionKind> {
        match (self.section, requested) {
            (Some(station), Some(submitted)) if station != submitted => {
                Err(Error::SectionMismatch { station, submitted })
            }
            (Some(kind), _) | (None, Some(kind)) => Ok(kind),
            (None, None) => Err(Error::scan_payload(format!(
                "no section given for delivery {}; expected one of onsite, warehouse, quality, logistics, finance",
                self.id
            ))),
        }
    }
}

/// The text to encode in a delivery's QR code.
#[must_use]
pub fn qr_payload(id: &DeliveryId) -> String {
    serde_json::json!({ "qrCodeId": id.as_str() }).to_string()
}

/// Link to a delivery's station-selection page, or to one station's page.
#[must_use]
pub fn station_link(base_url: &str, id: &DeliveryId, section: Option<SectionKind>) -> String {
    let base = base_url.trim_end_matches('/');
    match section {
        Some(kind) => format!("{base}/{ROUTE_SEGMENT}/{id}/{kind}"),
        None => format!("{base}/{ROUTE_SEGMENT}/{id}"),
    }
}

/// Links to every station page for a delivery, in station order.
#[must_use]
pub fn station_links(base_url: &str, id: &DeliveryId) -> Vec<(SectionKind, String)> {
    SectionKind::ALL
        .into_iter()
        .map(|kind| (kind, station_link(base_url, id, Some(kind))))
        .collect()
}
