// MODEL: Transform state and frame pixels
pub mod transform;
pub mod frame;

pub use transform::{ShaderParams, TransformState};
pub use frame::{FrameBuffer, SourceImage};
