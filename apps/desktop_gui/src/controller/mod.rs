//! Controller layer: UI events coming back from the backend and command orchestration.

pub mod events;
pub mod orchestration;
