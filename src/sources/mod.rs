//! External collaborators.
//!
//! The resolver produces the wheel set, the inspector reads a wheel's
//! requirements, and the downloader fetches sibling platform wheels. Each is
//! a trait so the pipeline can be driven by fakes in tests.

pub mod download;
pub mod inspector;
pub mod resolver;

pub use download::{Downloader, HttpDownloader};
pub use inspector::{CachingInspector, MetadataInspector, WheelToolInspector};
pub use resolver::{LinkIndex, PipResolver, Resolver};
