//! # brewhub-domain
//!
//! Pure domain model for the brewhub brewing-rig controller.
//!
//! ## Responsibilities
//! - Foundational types: typed property values, device state, error conventions
//! - Define the **Property Store** (typed, named configuration values bound to
//!   every device)
//! - Define **SensorReading** / **ActorState** (measurements and actuator state,
//!   authoritative or shadow)
//! - Define the **messages** exchanged between equipment and the orchestrator
//!   (snapshots in, intents out) and the web command contract
//! - Define the **equipment state machine** core: behavioral state, control
//!   mode, and the hysteresis decision function
//! - Define the **rig configuration document** (ordered device declarations)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and no IO.
//! It must never import anything from `app`, adapters, or async crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod config;
pub mod control;
pub mod error;
pub mod message;
pub mod property;
pub mod state;
