//! Streaming backends shipped with the client

pub mod delivery;
pub mod replay;
pub mod simulated;

pub use replay::{Recording, ReplayBackend};
pub use simulated::{FrameScript, SimulatedBackend, SimulatedOptions};
