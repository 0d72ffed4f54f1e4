//! VPAID Core - Ad creative controller for host-driven video ad lifecycles
//!
//! This crate provides the creative side of the VPAID contract:
//! - Attribute store for geometry, volume, skippability and timing
//! - Event registry with one host callback per lifecycle event
//! - Ad parameter ingestion and media resolution
//! - Lifecycle state machine driving the host's mount points
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          VPAID Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  Attribute   │  │    Event     │  │    Param     │          │
//! │  │    Store     │  │   Registry   │  │    Loader    │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │     Ad      │                              │
//! │                    │ Controller  │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │              ┌────────────┴────────────┐                        │
//! │              │   Mount points (host)   │                        │
//! │              │  container · video slot │                        │
//! │              └─────────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod attributes;
pub mod events;
pub mod params;
pub mod mount;
pub mod config;
pub mod controller;

pub use error::{Error, Result};
pub use attributes::{AttributeField, AttributeSet, AttributeValue, ViewMode};
pub use events::{AdEvent, Binding, EventHandler, EventKind, EventRegistry};
pub use params::{resolve, CreativeData, CreativeParameters, MediaDescriptor};
pub use mount::{
    AutoplaySettings, ContainerProvider, ContainerSlot, Environment, HeadlessContainer,
    HeadlessContainerProvider, HeadlessVideoSlot, LoadedContinuation, MediaPlayback, VideoSlot,
};
pub use config::CreativeConfig;
pub use controller::{AdController, AdState, CreativeId, VPAID_VERSION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, protocol = VPAID_VERSION, "VPAID Core initialized");
}
