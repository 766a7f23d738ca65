//! # Near Core
//!
//! Player proximity awareness for the game server: who is near me, and a
//! live bar that keeps pointing at one chosen player.
//!
//! ## Core Features
//!
//! - **Radius resolution**: explicit argument, permission override, group
//!   mapping or default, validated against configured limits
//! - **Radius cache**: overrides kept current from permission grant/revoke
//!   notifications
//! - **Proximity scan**: same-world players within a radius, with vanish and
//!   ignore-list filtering and a candidate cap
//! - **Live trackers**: one bar per viewer, periodic refresh, distance gates,
//!   timeout, distance or time based progress
//!
//! ## Host Integration
//!
//! The host hands in its capabilities once through [`NearHost`] and then
//! calls into [`NearService`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use near_core::host::memory::{InMemoryWorld, RecordingDisplay, RecordingNotifier};
//! use near_core::scheduler::ManualScheduler;
//! use near_core::types::{Location, Position};
//! use near_core::{NearHost, NearService, NearSettings};
//!
//! let world = Arc::new(InMemoryWorld::new());
//! let service = NearService::new(
//!     NearSettings::default(),
//!     NearHost {
//!         presence: world.clone(),
//!         permissions: world.clone(),
//!         display: Arc::new(RecordingDisplay::new()),
//!         notifier: Arc::new(RecordingNotifier::new()),
//!         scheduler: Arc::new(ManualScheduler::new()),
//!     },
//! );
//!
//! let me = world.join("Alex", Location::new("world", Position::new(0.0, 64.0, 0.0), 0.0));
//! world.join("Steve", Location::new("world", Position::new(10.0, 64.0, 0.0), 0.0));
//!
//! let radius = service.resolve_radius(me, None).unwrap();
//! let nearby = service.scan_nearby(me, radius).unwrap();
//! assert_eq!(nearby[0].name, "Steve");
//! ```

pub mod direction;
pub mod error;
pub mod host;
pub mod permissions;
pub mod radius_cache;
pub mod radius_policy;
pub mod scan;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod tracker;
pub mod types;

pub use error::{ConfigError, ConfigResult, NearError, NearResult, PolicyRejection, Unreachable};
pub use scan::Candidate;
pub use service::{NearHost, NearService};
pub use settings::NearSettings;
pub use tracker::{Notice, Notifier};
pub use types::{Location, PlayerId, PlayerSnapshot, Position};
