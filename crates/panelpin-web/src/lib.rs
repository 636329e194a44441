#![forbid(unsafe_code)]

//! `panelpin-web` adapts [`panelpin_core`] to browser-style hosts.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes scroll and resize
//!   events; nothing here registers listeners or timers.
//! - **Frame coalescing**: any burst of events between two animation frames
//!   costs one evaluation pass.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! On `wasm32` the [`PanelHost`] type is exported through `wasm-bindgen`.

pub mod driver;
pub mod event;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::PanelHost;

pub use driver::{FrameDriver, FrameReport, ViewportState};
pub use event::{HostEventSource, ScrollEvent};
