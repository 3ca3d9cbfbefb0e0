pub mod render;
pub mod run;

pub use render::RenderCommand;
pub use run::{RunCommand, RunOptions};
