pub mod config;
pub mod discovery;
pub mod error;
pub mod lookup;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod syntax;
pub mod transform;

pub use config::Config;
pub use error::{Result, RewriteError};
pub use lookup::{CodeInfo, ManifestIndex};
pub use manifest::ManifestEmitter;
pub use package::PackageMetadata;
pub use pipeline::{FileReport, Pipeline, RunOptions, RunReport};
pub use transform::{CodeAllocator, ErrorCode, ErrorCodeEntry, Transformer};
