//! In-memory [`LotRepository`].
//!
//! Holds every record in ordered maps. Used by tests and by callers that
//! want to run the lot rules over data already loaded from elsewhere.

use std::collections::BTreeMap;

use living_lots_lot_models::{
    AvailableProperty, BillingAccount, LandUseArea, License, Lot, LotDetails, LotGroup, Owner,
    Parcel, Use, Violation, WaterParcel,
};

use crate::{LotError, LotRepository, visibility};

/// A [`LotRepository`] backed by `BTreeMap`s.
#[derive(Debug, Default, Clone)]
pub struct MemoryLotStore {
    lots: BTreeMap<i64, Lot>,
    parcels: BTreeMap<i64, Parcel>,
    uses: BTreeMap<i64, Use>,
    owners: BTreeMap<i64, Owner>,
    available_properties: BTreeMap<i64, AvailableProperty>,
    land_use_areas: BTreeMap<i64, LandUseArea>,
    water_parcels: BTreeMap<i64, WaterParcel>,
    billing_accounts: BTreeMap<i64, BillingAccount>,
    /// lot id -> licenses
    licenses: BTreeMap<i64, Vec<License>>,
    /// lot id -> violations
    violations: BTreeMap<i64, Vec<Violation>>,
}

impl MemoryLotStore {
    pub fn insert_parcel(&mut self, parcel: Parcel) {
        self.parcels.insert(parcel.id, parcel);
    }

    pub fn insert_use(&mut self, known_use: Use) {
        self.uses.insert(known_use.id, known_use);
    }

    pub fn insert_owner(&mut self, owner: Owner) {
        self.owners.insert(owner.id, owner);
    }

    pub fn insert_available_property(&mut self, property: AvailableProperty) {
        self.available_properties.insert(property.id, property);
    }

    pub fn insert_land_use_area(&mut self, area: LandUseArea) {
        self.land_use_areas.insert(area.id, area);
    }

    pub fn insert_water_parcel(&mut self, parcel: WaterParcel) {
        self.water_parcels.insert(parcel.id, parcel);
    }

    pub fn insert_billing_account(&mut self, account: BillingAccount) {
        self.billing_accounts.insert(account.id, account);
    }

    /// Links a license to a lot.
    pub fn add_license(&mut self, lot_id: i64, license: License) {
        self.licenses.entry(lot_id).or_default().push(license);
    }

    /// Links a violation to a lot.
    pub fn add_violation(&mut self, lot_id: i64, violation: Violation) {
        self.violations.entry(lot_id).or_default().push(violation);
    }

    fn linked<T: Clone>(map: &BTreeMap<i64, T>, id: Option<i64>) -> Option<T> {
        id.and_then(|id| map.get(&id).cloned())
    }
}

impl LotRepository for MemoryLotStore {
    fn lot(&self, id: i64) -> Result<Option<Lot>, LotError> {
        Ok(self.lots.get(&id).cloned())
    }

    fn lots(&self) -> Result<Vec<Lot>, LotError> {
        Ok(self.lots.values().cloned().collect())
    }

    fn visible_lots(&self) -> Result<Vec<Lot>, LotError> {
        Ok(self
            .lots
            .values()
            .filter(|lot| {
                let known_use = lot.known_use_id.and_then(|id| self.uses.get(&id));
                visibility::is_publicly_listed(lot, known_use)
            })
            .cloned()
            .collect())
    }

    fn lot_details(&self, id: i64) -> Result<Option<LotDetails>, LotError> {
        let Some(lot) = self.lots.get(&id).cloned() else {
            return Ok(None);
        };

        Ok(Some(LotDetails {
            owner: Self::linked(&self.owners, lot.owner_id),
            known_use: Self::linked(&self.uses, lot.known_use_id),
            available_property: Self::linked(
                &self.available_properties,
                lot.available_property_id,
            ),
            land_use_area: Self::linked(&self.land_use_areas, lot.land_use_area_id),
            water_parcel: Self::linked(&self.water_parcels, lot.water_parcel_id),
            billing_account: Self::linked(&self.billing_accounts, lot.billing_account_id),
            licenses: self.licenses.get(&id).cloned().unwrap_or_default(),
            violations: self.violations.get(&id).cloned().unwrap_or_default(),
            lot,
        }))
    }

    fn group_members(&self, group_id: i64) -> Result<Vec<Lot>, LotError> {
        Ok(self
            .lots
            .values()
            .filter(|lot| lot.group_id == Some(group_id))
            .cloned()
            .collect())
    }

    fn parcel(&self, id: i64) -> Result<Option<Parcel>, LotError> {
        Ok(self.parcels.get(&id).cloned())
    }

    fn known_use(&self, id: i64) -> Result<Option<Use>, LotError> {
        Ok(self.uses.get(&id).cloned())
    }

    fn next_lot_id(&self) -> Result<i64, LotError> {
        Ok(self.lots.keys().next_back().map_or(1, |id| id + 1))
    }

    fn save_lot(&mut self, lot: &Lot) -> Result<(), LotError> {
        self.lots.insert(lot.id, lot.clone());
        Ok(())
    }

    fn save_group(&mut self, group: &LotGroup) -> Result<(), LotError> {
        self.lots.insert(group.id(), group.lot.clone());
        Ok(())
    }

    fn delete_lot(&mut self, id: i64) -> Result<(), LotError> {
        self.lots.remove(&id);
        for lot in self.lots.values_mut() {
            if lot.group_id == Some(id) {
                lot.group_id = None;
            }
        }
        self.licenses.remove(&id);
        self.violations.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_join_linked_records() {
        let mut store = MemoryLotStore::default();
        store.insert_owner(Owner {
            id: 7,
            name: "Philadelphia Housing Authority".to_string(),
            owner_type: living_lots_lot_models::OwnerType::Public,
        });
        let mut lot = Lot::new(1);
        lot.owner_id = Some(7);
        store.save_lot(&lot).unwrap();
        store.add_license(
            1,
            License {
                id: 3,
                status: "ACTIVE".to_string(),
            },
        );

        let details = store.lot_details(1).unwrap().unwrap();
        assert_eq!(details.owner_name(), "Philadelphia Housing Authority");
        assert_eq!(details.licenses.len(), 1);
        assert!(details.violations.is_empty());
        assert!(store.lot_details(2).unwrap().is_none());
    }

    #[test]
    fn deleting_group_detaches_members() {
        let mut store = MemoryLotStore::default();
        store.save_group(&LotGroup::new(10, "Block")).unwrap();
        let mut lot = Lot::new(1);
        lot.group_id = Some(10);
        store.save_lot(&lot).unwrap();

        store.delete_lot(10).unwrap();

        assert!(store.group(10).unwrap().is_none());
        assert_eq!(store.lot(1).unwrap().unwrap().group_id, None);
    }

    #[test]
    fn next_lot_id_follows_highest_id() {
        let mut store = MemoryLotStore::default();
        assert_eq!(store.next_lot_id().unwrap(), 1);
        store.save_lot(&Lot::new(41)).unwrap();
        assert_eq!(store.next_lot_id().unwrap(), 42);
    }
}
