//! Registry implementations for resolving module versions

pub mod private;
pub mod public;

pub use private::PrivateRegistry;
pub use public::PublicRegistry;
