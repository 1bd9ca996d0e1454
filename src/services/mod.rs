// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod matcher;
pub mod session;
pub mod strava;
pub mod sync;

pub use session::{Session, SessionStore};
pub use strava::StravaClient;
pub use sync::Synchronizer;
