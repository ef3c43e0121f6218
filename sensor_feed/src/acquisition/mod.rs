//! The acquisition state machine: one observable state per configured feed.

pub mod machine;
pub mod transition;

pub use machine::{AcquisitionMachine, MachineOptions, StartError};
