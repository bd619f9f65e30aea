// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optional, shareable handle on the audit log.

use std::sync::{Arc, Mutex};

use hashmark_core::types::{FileDigest, VerificationId};
use hashmark_integrity::{AuditAction, AuditLog};
use tracing::warn;

/// Audit log shared between the verifier and the publisher. Detached by
/// default; recording into a detached trail does nothing.
#[derive(Clone, Default)]
pub struct AuditTrail(Option<Arc<Mutex<AuditLog>>>);

impl AuditTrail {
    pub fn detached() -> Self {
        Self(None)
    }

    pub fn attach(log: AuditLog) -> Self {
        Self(Some(Arc::new(Mutex::new(log))))
    }

    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }

    /// Record one outcome. A failing audit write is logged, never surfaced:
    /// the verdict has already been reached and stays valid.
    pub fn record(
        &self,
        action: AuditAction,
        verification_id: Option<VerificationId>,
        digest: &FileDigest,
        success: bool,
        details: Option<&str>,
    ) {
        let Some(log) = &self.0 else {
            return;
        };
        let result = match log.lock() {
            Ok(log) => log.record(action, verification_id, digest, success, details),
            Err(_) => {
                warn!(%action, "audit log lock poisoned, entry dropped");
                return;
            }
        };
        if let Err(err) = result {
            warn!(%action, %err, "failed to write audit entry");
        }
    }

    /// Run `f` against the attached log, if any.
    pub fn with_log<T>(&self, f: impl FnOnce(&AuditLog) -> T) -> Option<T> {
        let log = self.0.as_ref()?;
        let guard = log.lock().ok()?;
        Some(f(&*guard))
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuditTrail").field(&self.is_attached()).finish()
    }
}
