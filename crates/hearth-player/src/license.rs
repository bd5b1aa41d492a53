//! Unlocked licenses.
//!
//! A license gates a weapon class. Completing its mission unlocks it; the
//! completion count only matters for reward scaling and is carried through
//! untouched.

use std::collections::BTreeMap;

use hearth_data::{LicenseRecord, PlayerRecord, PlayerStore, StoreError};
use hearth_protocol::{AccountId, LICENSE_COUNT, LicenseId};

use crate::ChangeTracker;

#[derive(Debug, Default)]
pub struct LicenseManager {
    /// License → times completed.
    licenses: BTreeMap<LicenseId, u32>,
    tracker: ChangeTracker,
}

impl LicenseManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, record: &PlayerRecord) {
        self.licenses = record
            .licenses
            .iter()
            .filter(|l| usize::from(l.license.0) < LICENSE_COUNT)
            .map(|l| (l.license, l.times_completed))
            .collect();
        self.tracker.mark_clean();
    }

    /// Unlocks a license. Returns `false` if it was already held.
    pub fn unlock(&mut self, license: LicenseId) -> bool {
        if self.licenses.contains_key(&license) {
            return false;
        }
        self.licenses.insert(license, 1);
        self.tracker.mark_dirty();
        true
    }

    pub fn contains(&self, license: LicenseId) -> bool {
        self.licenses.contains_key(&license)
    }

    /// Unlocked licenses in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = LicenseId> + '_ {
        self.licenses.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub async fn save<S: PlayerStore>(
        &self,
        store: &S,
        account: AccountId,
    ) -> Result<(), StoreError> {
        let Some(revision) = self.tracker.begin_flush() else {
            return Ok(());
        };
        let records: Vec<LicenseRecord> = self
            .licenses
            .iter()
            .map(|(&license, &times_completed)| LicenseRecord {
                license,
                times_completed,
            })
            .collect();
        store.save_licenses(account, &records).await?;
        self.tracker.complete_flush(revision);
        tracing::debug!(licenses = records.len(), "licenses saved");
        Ok(())
    }
}
