//! Device link for CellAdvisor instruments
//!
//! One `DeviceLink` owns one persistent TCP connection to the instrument
//! and exposes the remote-control operation surface on top of the frame
//! codec: status probing, screen capture, SCPI passthrough and measurement
//! retrieval. Links are single-owner: exactly one worker drives a link at
//! a time, so no locking happens at this layer.

pub mod link;

pub use link::{DeviceLink, InstrumentLink, TcpDeviceLink};
