//! Station-scoped access to the store.
//!
//! A [`Station`] reads whole records but writes only its own section.

use crate::error::{Error, Result};
use crate::identifier::DeliveryId;
use crate::record::{DeliveryRecord, SectionKind, SectionUpdate};
use crate::storage::DeliveryStore;

/// One handling station bound to a store.
#[derive(Debug, Clone, Copy)]
pub struct Station<'a> {
    store: &'a DeliveryStore,
    kind: SectionKind,
}

impl<'a> Station<'a> {
    /// Bind a station to the store.
    #[must_use]
    pub fn new(store: &'a DeliveryStore, kind: SectionKind) -> Self {
        Self { store, kind }
    }

    /// The section this station owns.
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Read the full record, other stations' sections included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the delivery does not exist.
    pub fn view(&self, id: &DeliveryId) -> Result<DeliveryRecord> {
        self.store.get(id)
    }

    /// Replace this station's section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionMismatch`] if `update` targets another
    /// section, otherwise whatever [`DeliveryStore::update_section`] returns.
    pub fn submit(&self, id: &DeliveryId, update: SectionUpdate) -> Result<DeliveryRecord> {
        if update.kind() != self.kind {
            return Err(Error::SectionMismatch {
                station: self.kind,
                submitted: update.kind(),
            });
        }
        self.store.update_section(id, update)
    }

    /// Parse a submitted form body for this station's section and store it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body is rejected, or whatever
    /// [`Station::submit`] returns.
    pub fn submit_json(&self, id: &DeliveryId, body: serde_json::Value) -> Result<DeliveryRecord> {
        let update = SectionUpdate::from_json(self.kind, body)?;
        self.submit(id, update)
    }
}
