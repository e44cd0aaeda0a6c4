//! Simulated collaborators for demo captures and deterministic tests.
//!
//! The scan and geolocation hardware integrations live outside this crate;
//! these stand-ins reproduce their timing behavior (a lookup delay with a
//! little jitter, a fix that may never arrive) without any device access.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use super::ports::{
    AssetCatalog, CatalogError, IdentityProvider, LocationError, LocationService, LookupOutcome,
};
use super::session::{Asset, GpsFix, TechnicianId};

/// Catalog stand-in with a configurable lookup delay.
pub struct SimulatedCatalog {
    delay: Duration,
    asset: Option<Asset>,
}

impl SimulatedCatalog {
    /// Catalog that resolves nothing; every scan falls back to the
    /// placeholder asset.
    pub fn new(delay: Duration) -> Self {
        Self { delay, asset: None }
    }

    /// Catalog that resolves every scan to the given asset.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }
}

#[async_trait]
impl AssetCatalog for SimulatedCatalog {
    async fn lookup_asset(&self) -> Result<LookupOutcome, CatalogError> {
        let jitter = rand::rng().random_range(0..250);
        sleep(self.delay + Duration::from_millis(jitter)).await;

        Ok(match &self.asset {
            Some(asset) => LookupOutcome::Found(asset.clone()),
            None => LookupOutcome::NotFound,
        })
    }
}

/// Location stand-in. With no fix configured it never resolves, modeling a
/// device that cannot get a signal; the coordinator's timeout bounds it.
pub struct SimulatedLocationService {
    delay: Duration,
    fix: Option<GpsFix>,
}

impl SimulatedLocationService {
    pub fn new(delay: Duration, fix: Option<GpsFix>) -> Self {
        Self { delay, fix }
    }
}

#[async_trait]
impl LocationService for SimulatedLocationService {
    async fn acquire_fix(&self) -> Result<GpsFix, LocationError> {
        match self.fix {
            Some(fix) => {
                sleep(self.delay).await;
                Ok(fix)
            }
            None => {
                std::future::pending::<()>().await;
                Err(LocationError::Unavailable {
                    reason: "no signal".to_string(),
                })
            }
        }
    }
}

/// Identity provider bound to a fixed technician (or to nobody).
pub struct StaticIdentity {
    technician: Option<TechnicianId>,
}

impl StaticIdentity {
    pub fn new(technician: Option<TechnicianId>) -> Self {
        Self { technician }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_technician(&self) -> Option<TechnicianId> {
        self.technician.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_catalog_miss() {
        let catalog = SimulatedCatalog::new(Duration::from_millis(1));
        let outcome = tokio_test::block_on(catalog.lookup_asset()).unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[test]
    fn test_simulated_catalog_hit() {
        let catalog =
            SimulatedCatalog::new(Duration::from_millis(1)).with_asset(Asset::placeholder());
        let outcome = tokio_test::block_on(catalog.lookup_asset()).unwrap();
        assert!(matches!(outcome, LookupOutcome::Found(_)));
    }

    #[test]
    fn test_static_identity() {
        let bound = StaticIdentity::new(Some(TechnicianId("TECH-001".to_string())));
        assert_eq!(
            bound.current_technician(),
            Some(TechnicianId("TECH-001".to_string()))
        );

        let anonymous = StaticIdentity::new(None);
        assert_eq!(anonymous.current_technician(), None);
    }
}
