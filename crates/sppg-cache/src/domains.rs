//! Domain presets over the generic cache methods.
//!
//! Each preset fixes the logical key, TTL class and tag set for one screen's
//! data. They carry no logic of their own; they only keep key/tag usage
//! consistent across the app layer.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::entry::{CacheOptions, TtlClass};
use crate::manager::CacheManager;

/// A fixed (key, TTL class, tags) binding for one cached domain dataset.
#[derive(Debug, Clone, Copy)]
pub struct CachePreset {
    pub key: &'static str,
    pub ttl: TtlClass,
    pub tags: &'static [&'static str],
}

/// Daily menu plans per tenant.
pub const MENUS: CachePreset = CachePreset {
    key: "menus",
    ttl: TtlClass::Medium,
    tags: &["menus", "dashboard"],
};

/// Food production batches.
pub const PRODUCTIONS: CachePreset = CachePreset {
    key: "productions",
    ttl: TtlClass::Short,
    tags: &["productions", "dashboard"],
};

/// Ingredient inventory levels.
pub const INVENTORY: CachePreset = CachePreset {
    key: "inventory",
    ttl: TtlClass::Short,
    tags: &["inventory", "dashboard"],
};

/// HRD employee roster.
pub const EMPLOYEES: CachePreset = CachePreset {
    key: "employees",
    ttl: TtlClass::Long,
    tags: &["employees"],
};

/// Aggregated dashboard statistics.
pub const DASHBOARD_STATS: CachePreset = CachePreset {
    key: "dashboard-stats",
    ttl: TtlClass::Short,
    tags: &["dashboard"],
};

impl CacheManager {
    /// Cache a payload under a preset's key/TTL/tags.
    pub async fn set_preset<T: Serialize>(
        &self,
        preset: &CachePreset,
        tenant: Option<&str>,
        data: &T,
    ) -> bool {
        let options = CacheOptions::with_tags(preset.tags.iter().copied())
            .ttl(preset.ttl.resolve(self.config()));
        self.set(preset.key, data, tenant, options).await
    }

    /// Read a payload cached under a preset's key.
    pub async fn get_preset<T: DeserializeOwned>(
        &self,
        preset: &CachePreset,
        tenant: Option<&str>,
    ) -> Option<T> {
        self.get(preset.key, tenant).await
    }

    /// Populate a preset by running a loader callback.
    ///
    /// Loader failures are logged and reported as `false`; they never
    /// propagate into the caller.
    pub async fn warm_preset<T, F, Fut>(
        &self,
        preset: &CachePreset,
        tenant: Option<&str>,
        loader: F,
    ) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match loader().await {
            Ok(data) => self.set_preset(preset, tenant, &data).await,
            Err(e) => {
                warn!(error = %e, key = preset.key, "cache warm loader failed");
                false
            }
        }
    }

    pub async fn set_menus<T: Serialize>(&self, tenant: Option<&str>, data: &T) -> bool {
        self.set_preset(&MENUS, tenant, data).await
    }

    pub async fn get_menus<T: DeserializeOwned>(&self, tenant: Option<&str>) -> Option<T> {
        self.get_preset(&MENUS, tenant).await
    }

    pub async fn warm_menus_cache<T, F, Fut>(&self, tenant: Option<&str>, loader: F) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.warm_preset(&MENUS, tenant, loader).await
    }

    pub async fn set_productions<T: Serialize>(&self, tenant: Option<&str>, data: &T) -> bool {
        self.set_preset(&PRODUCTIONS, tenant, data).await
    }

    pub async fn get_productions<T: DeserializeOwned>(&self, tenant: Option<&str>) -> Option<T> {
        self.get_preset(&PRODUCTIONS, tenant).await
    }

    pub async fn warm_productions_cache<T, F, Fut>(&self, tenant: Option<&str>, loader: F) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.warm_preset(&PRODUCTIONS, tenant, loader).await
    }

    pub async fn set_inventory<T: Serialize>(&self, tenant: Option<&str>, data: &T) -> bool {
        self.set_preset(&INVENTORY, tenant, data).await
    }

    pub async fn get_inventory<T: DeserializeOwned>(&self, tenant: Option<&str>) -> Option<T> {
        self.get_preset(&INVENTORY, tenant).await
    }

    pub async fn set_employees<T: Serialize>(&self, tenant: Option<&str>, data: &T) -> bool {
        self.set_preset(&EMPLOYEES, tenant, data).await
    }

    pub async fn get_employees<T: DeserializeOwned>(&self, tenant: Option<&str>) -> Option<T> {
        self.get_preset(&EMPLOYEES, tenant).await
    }

    pub async fn set_dashboard_stats<T: Serialize>(&self, tenant: Option<&str>, data: &T) -> bool {
        self.set_preset(&DASHBOARD_STATS, tenant, data).await
    }

    pub async fn get_dashboard_stats<T: DeserializeOwned>(&self, tenant: Option<&str>) -> Option<T> {
        self.get_preset(&DASHBOARD_STATS, tenant).await
    }

    pub async fn warm_dashboard_cache<T, F, Fut>(&self, tenant: Option<&str>, loader: F) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.warm_preset(&DASHBOARD_STATS, tenant, loader).await
    }
}
