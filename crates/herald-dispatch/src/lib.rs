// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message dispatch worker.
//!
//! Polls the store for pending or failed messages, claims them, delivers
//! them through the configured [`SenderAdapter`](herald_core::SenderAdapter)
//! and writes every outcome back as a status transition. Errors never
//! escape the polling loop.

pub mod controller;
pub mod recording;
pub mod seed;
pub mod shutdown;
pub mod validate;
pub mod worker;

pub use controller::DispatchController;
pub use seed::{SeedReport, seed_messages};
pub use validate::{Malformed, validate_message};
pub use worker::{CycleReport, DispatchWorker};
