//! # brewhub-app
//!
//! The device control framework — everything between the pure domain types
//! and the hardware adapters.
//!
//! ## Responsibilities
//! - Define the **capability traits** concrete device kinds implement
//!   ([`device::Device`], [`device::Actor`], [`device::Sensor`],
//!   [`device::Buzzer`], [`equipment::Equipment`]) plus the composition
//!   helpers they embed ([`device::DeviceCore`], [`device::ActorCore`], …)
//! - Provide the **device registry** mapping configuration type tags to
//!   builder closures, so new kinds plug in without touching the orchestrator
//! - Run the **control orchestrator**: device instantiation from the rig
//!   document, the single-mutator event loop, snapshot broadcasts, and the
//!   web command contract
//! - Run the **fan-out logger** every component logs through
//! - Define the **hardware ports** adapters implement ([`ports`])
//!
//! ## Concurrency model
//! Cooperating tokio tasks communicating exclusively through bounded queues:
//! one per sensor, one per equipment, one orchestrator event loop, one
//! logger dispatcher, and one writer per log sink. Authoritative state is
//! mutated only by the orchestrator task; everything else sees snapshots.
//! Every long-running loop takes a [`tokio_util::sync::CancellationToken`].
//!
//! ## Dependency rule
//! Depends on `brewhub-domain` only (plus tokio primitives). Never imports
//! adapter crates — adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod device;
pub mod equipment;
pub mod logger;
pub mod ports;
pub mod registry;
pub mod sensor;
