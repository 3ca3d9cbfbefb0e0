pub mod address;
pub mod builder;
pub mod synthesizer;

pub use builder::Module;
pub use synthesizer::Synthesizer;
