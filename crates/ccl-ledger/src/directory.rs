use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ccl_types::{FacilityId, FacilityType};

use crate::error::{RecorderError, RecorderResult};

/// Boundary to the external identity provider's facility registry.
///
/// The recorder only needs existence and type; everything else about a
/// facility lives with the provider.
#[async_trait]
pub trait FacilityDirectory: Send + Sync {
    /// Resolve a facility's type. Returns `Ok(None)` if unregistered.
    async fn facility_type(&self, id: &FacilityId) -> RecorderResult<Option<FacilityType>>;
}

/// In-memory facility registry for tests and embedded deployments.
pub struct MemoryDirectory {
    inner: RwLock<HashMap<FacilityId, FacilityType>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, id: FacilityId, facility_type: FacilityType) -> RecorderResult<()> {
        self.inner
            .write()
            .map_err(|_| RecorderError::Directory("directory lock poisoned".into()))?
            .insert(id, facility_type);
        Ok(())
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FacilityDirectory for MemoryDirectory {
    async fn facility_type(&self, id: &FacilityId) -> RecorderResult<Option<FacilityType>> {
        Ok(self
            .inner
            .read()
            .map_err(|_| RecorderError::Directory("directory lock poisoned".into()))?
            .get(id)
            .copied())
    }
}
