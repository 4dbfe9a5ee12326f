pub mod finalizer;
pub mod generator;
pub mod links;
pub mod module_graph;
pub mod producers;
pub mod routing;
pub mod system;
pub mod wiring;

pub use crate::domain::ports::{Storage, SystemSource};
pub use crate::utils::error::Result;
