//! `envsubst_core` substitutes `$NAME` and `${NAME}` placeholders in text.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Input characters
//!   → Scanner (state machine: Initial / ReadingName / ReadingBracedName)
//!   → Resolver (variable map, then process environment)
//!   → Sink (String, or any io::Write)
//! ```
//!
//! Substitution is total: a lone `$`, an unterminated `${NAME` or an invalid
//! character inside braces is copied to the output literally. The only error
//! a pass can raise comes from the output sink.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `envsubst.toml`, including
//!   inline variables and variables files.
//! - [`encoding`]: JSON, YAML and TOML dispatch by name or file extension,
//!   file conversion, and decoding of substituted template files.
//!
//! ## Key Types
//!
//! - [`Scanner`]: The single-pass placeholder state machine.
//! - [`Resolve`]: Maps a name to its value; implemented for closures.
//! - [`LayeredResolver`]: Variable map with environment fallback that
//!   tracks unresolved names.
//! - [`Diagnostics`]: Receives unresolved-name reports.
//! - [`SubstConfig`]: Configuration loaded from `envsubst.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use envsubst_core::CollectedDiagnostics;
//! use envsubst_core::substitute_vars;
//!
//! let vars = HashMap::from([("GREETING".to_string(), "hello".to_string())]);
//! let diagnostics = CollectedDiagnostics::new();
//! let result = substitute_vars(
//! 	"$GREETING ${ENVSUBST_DOC_UNSET}",
//! 	&vars,
//! 	&diagnostics,
//! );
//!
//! assert_eq!(result.text, "hello ${ENVSUBST_DOC_UNSET}");
//! assert!(result.missing);
//! assert_eq!(diagnostics.names(), vec!["ENVSUBST_DOC_UNSET"]);
//! ```

pub use config::*;
pub use encoding::*;
pub use error::*;
pub use resolver::*;
pub use scanner::*;
pub use substitute::*;

pub mod config;
pub mod encoding;
#[allow(unused_assignments)]
mod error;
mod resolver;
mod scanner;
mod substitute;
