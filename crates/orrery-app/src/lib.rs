//! The orrery application: window, frame clock, input forwarding, config
//! hot reload and the render bootstrap that drives the scene.

pub mod frame_clock;
pub mod modal;
pub mod platform;
pub mod reload;
pub mod render;
pub mod window;
