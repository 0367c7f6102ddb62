// CONTROLLER: Input and per-frame update loop
pub mod input;
pub mod frame_loop;

pub use input::{ControlAction, InputEvent, InputState, Key};
pub use frame_loop::{FrameClock, FrameLoopContext, FrameOutput};
