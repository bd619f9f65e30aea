// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Size ceilings and match policies are per flow. The deployed system used
// 10 MiB for the pairwise compare endpoint and 100 MiB everywhere else, and
// compared name+size+digest in one place, name+digest in another. Both are
// kept as explicit settings instead of being baked into call sites.

use serde::{Deserialize, Serialize};

use crate::error::{HashmarkError, Result};
use crate::types::{MatchPolicy, OwnerAddress};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Ceiling used by the stricter flows.
pub const STRICT_SIZE_LIMIT: u64 = 10 * MIB;

/// Ceiling used by the looser flows.
pub const STANDARD_SIZE_LIMIT: u64 = 100 * MIB;

/// Upload rules for one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Largest accepted file in bytes. A file of exactly this size passes.
    pub max_size: u64,
    /// Reject anything whose declared media type is not `application/pdf`.
    pub require_pdf: bool,
}

impl FlowConfig {
    pub const fn new(max_size: u64, require_pdf: bool) -> Self {
        Self {
            max_size,
            require_pdf,
        }
    }
}

/// Match policy per comparison flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Two uploaded files compared with each other.
    pub pair: MatchPolicy,
    /// Candidate against a locally stored reference record.
    pub stored: MatchPolicy,
    /// Candidate against a digest already known (e.g. a ledger field).
    /// Such references carry no size, so this may not require one.
    pub known: MatchPolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            pair: MatchPolicy::FULL,
            stored: MatchPolicy::NAME_AND_DIGEST,
            known: MatchPolicy::NAME_AND_DIGEST,
        }
    }
}

/// Timeout and retry settings for ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pairwise compare of two uploads.
    pub compare: FlowConfig,
    /// Verification against a stored reference record.
    pub stored: FlowConfig,
    /// Verification against a known digest.
    pub known: FlowConfig,
    /// Verification by ledger lookup.
    pub ledger_lookup: FlowConfig,
    /// Publishing (single, batch, and revision uploads).
    pub publish: FlowConfig,
    #[serde(default)]
    pub policies: PolicyConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Rows per catalogue page.
    pub page_size: u32,
    /// Longest accepted record title, in characters.
    pub title_max_chars: usize,
    /// Address used for publishing and for listing "my documents".
    #[serde(default)]
    pub owner: Option<OwnerAddress>,
    /// Record every verification in the audit trail.
    pub audit_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            compare: FlowConfig::new(STRICT_SIZE_LIMIT, true),
            stored: FlowConfig::new(STANDARD_SIZE_LIMIT, true),
            known: FlowConfig::new(STANDARD_SIZE_LIMIT, false),
            ledger_lookup: FlowConfig::new(STANDARD_SIZE_LIMIT, false),
            publish: FlowConfig::new(STANDARD_SIZE_LIMIT, true),
            policies: PolicyConfig::default(),
            ledger: LedgerConfig::default(),
            page_size: 10,
            title_max_chars: 150,
            owner: None,
            audit_enabled: true,
        }
    }
}

impl AppConfig {
    /// Reject settings no flow can work with.
    pub fn validate(&self) -> Result<()> {
        let flows = [
            ("compare", &self.compare),
            ("stored", &self.stored),
            ("known", &self.known),
            ("ledger_lookup", &self.ledger_lookup),
            ("publish", &self.publish),
        ];
        for (name, flow) in flows {
            if flow.max_size == 0 {
                return Err(HashmarkError::Config(format!(
                    "{name}.max_size must be greater than zero"
                )));
            }
        }

        if self.policies.known.require_size {
            return Err(HashmarkError::Config(
                "policies.known cannot require a size match: known digests carry no size".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(HashmarkError::Config("page_size must be greater than zero".into()));
        }
        if self.title_max_chars == 0 {
            return Err(HashmarkError::Config(
                "title_max_chars must be greater than zero".into(),
            ));
        }
        if self.ledger.timeout_secs == 0 {
            return Err(HashmarkError::Config(
                "ledger.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
