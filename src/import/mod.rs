pub mod reconciler;

pub use reconciler::{ImportSummary, Reconciler};
