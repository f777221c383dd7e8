// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for arena and tree operations.

use core::fmt;

/// Error from arena slot operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The handle does not name a live slot: it was never reserved, was
    /// already released, or its slot has since been reused.
    ///
    /// A double release reports this too; the generation check makes an
    /// already-released handle indistinguishable from a stale one, and the
    /// free list can never be corrupted by it.
    NotLive,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLive => write!(f, "handle does not name a live arena slot"),
        }
    }
}

impl core::error::Error for ArenaError {}

/// Error from tree operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DbvhError {
    /// The handle does not name a live leaf in this tree.
    InvalidHandle,
}

impl fmt::Display for DbvhError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle => write!(f, "handle does not name a live leaf"),
        }
    }
}

impl core::error::Error for DbvhError {}

impl From<ArenaError> for DbvhError {
    fn from(_: ArenaError) -> Self {
        Self::InvalidHandle
    }
}
