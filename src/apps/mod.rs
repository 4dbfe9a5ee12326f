// Generators for the standard applications of a deployment.

pub mod endpoints;
pub mod fake_hsi;
pub mod hsi;

pub use endpoints::NetworkEndpoints;
pub use fake_hsi::{fake_hsi_app, FakeHsiOptions};
pub use hsi::hsi_app;
