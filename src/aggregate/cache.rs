//! Per-package registry response cache
//!
//! Wraps a [Registry] so that concurrent resolution of requirements sharing
//! a package name performs one upstream fetch. Each package name owns its
//! own async mutex slot; the slot lock is held across the fetch so a second
//! caller waits for the first instead of racing it. Failures are cached the
//! same way, so an unresolvable name costs one upstream round trip per pass
//! no matter how many requirements reference it. The cache lives inside one
//! [AggregationContext](super::AggregationContext) and dies with it.

use crate::domain::DependencyKind;
use crate::error::RegistryError;
use crate::registry::{PackageMetadata, Registry};
use async_trait::async_trait;
use semver::Version;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Slot = Arc<tokio::sync::Mutex<Option<Result<Arc<Vec<Version>>, RegistryError>>>>;

/// A registry wrapper caching version lists per package name
pub struct CachingRegistry<'a> {
    inner: &'a dyn Registry,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<'a> CachingRegistry<'a> {
    /// Wrap a registry with a fresh, empty cache
    pub fn new(inner: &'a dyn Registry) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap();
        slots.entry(key.to_string()).or_default().clone()
    }
}

#[async_trait]
impl Registry for CachingRegistry<'_> {
    async fn versions(
        &self,
        kind: DependencyKind,
        name: &str,
    ) -> Result<Vec<Version>, RegistryError> {
        let slot = self.slot(&format!("{}:{}", kind, name));
        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref() {
            return match cached {
                Ok(versions) => Ok(versions.as_ref().clone()),
                Err(err) => Err(err.clone()),
            };
        }
        let result = self.inner.versions(kind, name).await;
        *guard = Some(
            result
                .as_ref()
                .map(|versions| Arc::new(versions.clone()))
                .map_err(RegistryError::clone),
        );
        result
    }

    async fn metadata(
        &self,
        kind: DependencyKind,
        name: &str,
        version: &Version,
    ) -> Result<PackageMetadata, RegistryError> {
        self.inner.metadata(kind, name, version).await
    }

    async fn head_redirect(&self, url: &str) -> Result<Option<String>, RegistryError> {
        self.inner.head_redirect(url).await
    }

    async fn fetch_module(&self, url: &str) -> Result<String, RegistryError> {
        self.inner.fetch_module(url).await
    }
}
