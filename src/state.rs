//! Camera state tracking
//!
//! This module holds the last dispatched camera values and the dispatcher
//! that decides which commands a new snapshot requires. Nothing is sent for
//! a field whose target matches the cache bit for bit.

mod cache;
mod dispatcher;
mod types;

pub use cache::StateCache;
pub use dispatcher::{ChangeDispatcher, DispatchFailure, DispatchReport};
pub use types::{
    channel_name, AbsoluteValues, CameraState, ExposureValues, ParameterSnapshot, SpeedValues,
    CHANNEL_COUNT, CHANNEL_NAMES, UNKNOWN_CHANNEL,
};
