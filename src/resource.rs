//! Primary execution resource
//!
//! A process-wide resource (think UI or main-thread affinity) that at
//! most one subtree may hold at a time. A second claim fails instead of
//! waiting.

use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::error::ConfigurationError;

static HOLDER: Mutex<Option<String>> = Mutex::new(None);

pub struct PrimaryResource;

impl PrimaryResource {
    /// Claim the resource for `claimant`, released when the returned
    /// claim is dropped.
    pub fn claim(claimant: &str) -> Result<PrimaryResourceClaim, ConfigurationError> {
        let mut holder = HOLDER.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = holder.as_ref() {
            return Err(ConfigurationError::PrimaryResourceClaimed {
                holder: current.clone(),
                requested_by: claimant.to_string(),
            });
        }
        debug!("Primary execution resource claimed by '{}'", claimant);
        *holder = Some(claimant.to_string());
        Ok(PrimaryResourceClaim {
            claimant: claimant.to_string(),
        })
    }

    pub fn holder() -> Option<String> {
        HOLDER
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug)]
pub struct PrimaryResourceClaim {
    claimant: String,
}

impl PrimaryResourceClaim {
    pub fn claimant(&self) -> &str {
        &self.claimant
    }
}

impl Drop for PrimaryResourceClaim {
    fn drop(&mut self) {
        let mut holder = HOLDER.lock().unwrap_or_else(PoisonError::into_inner);
        if holder.as_deref() == Some(self.claimant.as_str()) {
            *holder = None;
            debug!("Primary execution resource released by '{}'", self.claimant);
        }
    }
}
