// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command handlers, one file per top-level command.

pub mod audit;
pub mod compare;
pub mod config;
pub mod digest;
pub mod ledger;
pub mod reference;
