// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides a scripted sender and a temp-database harness for fast,
//! deterministic, CI-runnable tests without a real delivery gateway.
//!
//! # Components
//!
//! - [`MockSender`] - Sender adapter with scripted replies and send capture
//! - [`TestHarness`] - Temp SQLite store, mock sender and config in one place

pub mod harness;
pub mod mock_sender;

pub use harness::TestHarness;
pub use mock_sender::{MockReply, MockSender, SentMessage};
