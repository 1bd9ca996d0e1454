// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod preset;
pub mod summary;

pub use activity::Activity;
pub use preset::DistancePreset;
pub use summary::PerformanceSummary;
