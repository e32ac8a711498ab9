pub mod dump;
pub mod error;
pub mod ir;
pub mod loader;
pub mod logging;
pub mod serde_helpers;
pub mod table;
