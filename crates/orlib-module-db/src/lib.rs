//! Problem descriptor table used by the ORLib dashboard.
//!
//! Descriptors are static metadata: they say which problems exist, in which
//! order the dashboard shows them, and where each one's entry point lives.
//! Nothing in this crate loads module code.

mod descriptor;
mod registry;
mod stock;
mod store_json;

pub use descriptor::*;
pub use registry::*;
pub use stock::*;
pub use store_json::*;
