// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Both adapters extend [`PluginAdapter`] and use `#[async_trait]` so they can
//! be held as `Arc<dyn ...>` by the worker.

pub mod adapter;
pub mod sender;
pub mod storage;

pub use adapter::PluginAdapter;
pub use sender::SenderAdapter;
pub use storage::StorageAdapter;
