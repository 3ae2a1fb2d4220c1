//! # Flexload Indexer
//!
//! Resolves fully-qualified symbol names to the files that declare them,
//! without requiring the directory layout to mirror the namespaces.
//!
//! ## Pipeline
//!
//! ```text
//! register(root)
//!     │
//!     ├──> IndexCache ── hit ──> cached CacheEntry
//!     │       └─ miss ─> DirectoryScanner ──> SymbolExtractor ──> CacheEntry (persisted)
//!     │
//!     └──> Registry (class map, namespace map, roots)
//!
//! resolve(A.B.Name)
//!     │
//!     ├──> class map hit and file exists ──> path
//!     │
//!     └──> for prefix in [A.B, A]:
//!             rescan each namespace directory once ──> merge ──> retry
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flexload_indexer::{LoaderConfig, Resolution, Resolver};
//!
//! fn main() -> flexload_indexer::Result<()> {
//!     let mut resolver = Resolver::from_config(&LoaderConfig::default())?;
//!     resolver.register_root("/srv/app/src")?;
//!
//!     if let Resolution::Resolved(path) = resolver.resolve_name("Models.User")? {
//!         println!("Models.User is declared in {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod extractor;
mod index_cache;
mod lexer;
mod registry;
mod resolver;
mod scanner;
mod shared;
mod stats;
mod symbol;

pub use config::{LoaderConfig, CURRENT_DIR_SENTINEL};
pub use error::{LoaderError, Result};
pub use extractor::{
    Extraction, ExtractionError, ExtractionReport, FileDeclarations, SymbolExtractor,
};
pub use index_cache::{CacheEntry, IndexCache};
pub use lexer::LexError;
pub use registry::{Registry, SearchPath};
pub use resolver::{HostLoader, LoadOutcome, Registration, Resolution, Resolver};
pub use scanner::{DirectoryScanner, ScanOutcome};
pub use shared::SharedResolver;
pub use stats::{CacheStats, ResolveStats};
pub use symbol::{join_segments, Prefixes, Symbol, SymbolError, SEPARATOR};
