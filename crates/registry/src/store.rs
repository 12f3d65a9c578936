//! In-memory registry store
//!
//! Each campaign (and donor, and organization) sits behind its own
//! `tokio::sync::Mutex`: requests against the same campaign serialize,
//! requests against different campaigns run fully in parallel. Reads
//! for compliance decisions take the same lock writers hold, so there
//! are no stale reads.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::campaign::Campaign;
use crate::donor::Donor;
use crate::error::{RegistryError, RegistryResult};
use crate::organization::Organization;
use fundtrace_core::TrackingId;

/// Shared handle to a locked record
pub type Handle<T> = Arc<Mutex<T>>;

/// The registry of all ledger records
#[derive(Default)]
pub struct Registry {
    campaigns: RwLock<HashMap<TrackingId, Handle<Campaign>>>,
    donors: RwLock<HashMap<TrackingId, Handle<Donor>>>,
    organizations: RwLock<HashMap<TrackingId, Handle<Organization>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization. Overwrites nothing: registering an
    /// existing id returns the validation error instead.
    pub async fn register_organization(&self, org: Organization) -> RegistryResult<()> {
        let mut orgs = self.organizations.write().await;
        if orgs.contains_key(&org.org_id) {
            return Err(RegistryError::Validation(format!(
                "organization {} already registered",
                org.org_id
            )));
        }
        orgs.insert(org.org_id.clone(), Arc::new(Mutex::new(org)));
        Ok(())
    }

    /// Register a donor
    pub async fn register_donor(&self, donor: Donor) -> RegistryResult<()> {
        let mut donors = self.donors.write().await;
        if donors.contains_key(&donor.donor_id) {
            return Err(RegistryError::Validation(format!(
                "donor {} already registered",
                donor.donor_id
            )));
        }
        donors.insert(donor.donor_id.clone(), Arc::new(Mutex::new(donor)));
        Ok(())
    }

    /// Insert a campaign and link it to its owning organization.
    /// The organization must already be registered.
    pub async fn insert_campaign(&self, campaign: Campaign) -> RegistryResult<TrackingId> {
        let org = self.organization(&campaign.org_id).await?;
        let campaign_id = campaign.campaign_id.clone();

        {
            let mut campaigns = self.campaigns.write().await;
            campaigns.insert(campaign_id.clone(), Arc::new(Mutex::new(campaign)));
        }
        org.lock().await.campaign_ids.push(campaign_id.clone());
        Ok(campaign_id)
    }

    /// Look up a campaign handle
    pub async fn campaign(&self, campaign_id: &TrackingId) -> RegistryResult<Handle<Campaign>> {
        self.campaigns
            .read()
            .await
            .get(campaign_id)
            .cloned()
            .ok_or_else(|| RegistryError::CampaignNotFound(campaign_id.to_string()))
    }

    /// Look up a donor handle
    pub async fn donor(&self, donor_id: &TrackingId) -> RegistryResult<Handle<Donor>> {
        self.donors
            .read()
            .await
            .get(donor_id)
            .cloned()
            .ok_or_else(|| RegistryError::DonorNotFound(donor_id.to_string()))
    }

    /// Look up an organization handle
    pub async fn organization(&self, org_id: &TrackingId) -> RegistryResult<Handle<Organization>> {
        self.organizations
            .read()
            .await
            .get(org_id)
            .cloned()
            .ok_or_else(|| RegistryError::OrganizationNotFound(org_id.to_string()))
    }

    /// Handles to every campaign (reconciliation sweep input)
    pub async fn campaign_handles(&self) -> Vec<Handle<Campaign>> {
        self.campaigns.read().await.values().cloned().collect()
    }

    /// Handles to every donor (cross-store queries and replay)
    pub async fn donor_handles(&self) -> Vec<Handle<Donor>> {
        self.donors.read().await.values().cloned().collect()
    }

    /// Handles to every organization
    pub async fn organization_handles(&self) -> Vec<Handle<Organization>> {
        self.organizations.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundtrace_core::{Amount, IdKind};
    use rust_decimal_macros::dec;

    async fn registry_with_campaign() -> (Registry, TrackingId, TrackingId) {
        let registry = Registry::new();
        let org_id = TrackingId::generate(IdKind::Organization);
        registry
            .register_organization(Organization::new(org_id.clone(), "Relief Org", true))
            .await
            .unwrap();

        let campaign = Campaign::create(
            org_id.clone(),
            "Flood Response",
            Amount::new(dec!(5000)).unwrap(),
            vec![("Water".to_string(), Amount::new(dec!(2000)).unwrap())],
        )
        .unwrap();
        let campaign_id = registry.insert_campaign(campaign).await.unwrap();
        (registry, org_id, campaign_id)
    }

    #[tokio::test]
    async fn test_campaign_lookup() {
        let (registry, _, campaign_id) = registry_with_campaign().await;
        let handle = registry.campaign(&campaign_id).await.unwrap();
        assert_eq!(handle.lock().await.title, "Flood Response");
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_not_found() {
        let registry = Registry::new();
        let missing = TrackingId::generate(IdKind::Campaign);
        assert!(matches!(
            registry.campaign(&missing).await,
            Err(RegistryError::CampaignNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_campaign_requires_registered_org() {
        let registry = Registry::new();
        let campaign = Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Orphan campaign",
            Amount::new(dec!(100)).unwrap(),
            vec![("Misc".to_string(), Amount::new(dec!(100)).unwrap())],
        )
        .unwrap();
        assert!(matches!(
            registry.insert_campaign(campaign).await,
            Err(RegistryError::OrganizationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_campaign_linked_to_org() {
        let (registry, org_id, campaign_id) = registry_with_campaign().await;
        let org = registry.organization(&org_id).await.unwrap();
        assert_eq!(org.lock().await.campaign_ids, vec![campaign_id]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let registry = Registry::new();
        let donor_id = TrackingId::generate(IdKind::Donor);
        registry
            .register_donor(Donor::new(donor_id.clone(), "Alice"))
            .await
            .unwrap();
        let result = registry
            .register_donor(Donor::new(donor_id, "Alice again"))
            .await;
        assert!(matches!(result, Err(RegistryError::Validation(_))));
    }
}
