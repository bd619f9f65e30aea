// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hashmark-ledger — The append-only document ledger as seen from Hashmark.
//
// The ledger is reached only through `LedgerGateway`. This crate ships two
// local implementations with the contract's semantics (an in-memory fake and
// a SQLite-backed development ledger), the boundary layer that turns untyped
// contract results into domain types, and a timeout/retry wrapper.

pub mod boundary;
pub mod gateway;
pub mod local;
pub mod memory;
pub mod retry;

pub use gateway::{DEFAULT_PAGE_SIZE, LedgerGateway, Page};
pub use local::SqliteLedger;
pub use memory::MemoryLedger;
pub use retry::{ResilientLedger, RetryConfig};
