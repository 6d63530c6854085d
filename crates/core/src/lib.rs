pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod model;
pub mod opener;
pub mod project;
pub mod runtime;
pub mod usings;

pub use config::IndexConfig;
pub use error::{Result, ScopeError};
pub use model::{IndexSnapshot, NamespaceHit, ProjectRecord, ScanStats, SkipReason, SkipRecord};
pub use opener::SolutionOpener;
pub use runtime::{ProjectIndexService, RescanOutcome};
