//! **import-prepper** expands `#import` directives in shader sources. It is mostly aimed at GLSL
//! which doesn't provide include directive support out of the box.
//!
//! This crate does not implement a full C-like preprocessor. It inlines imported files,
//! detects circular imports, and honors two include guard styles: a leading `#pragma once`,
//! and the `#ifndef NAME` / `#define NAME` / `#endif` idiom. Other directives are copied
//! into the expanded code, so they can be subsequently handled by the shader compiler.
//!
//! Each file is inlined at most once per run; later imports of the same file produce a
//! `// Already imported: <path>` marker instead. Inlined files are wrapped in
//! `// BEGIN IMPORT` / `// END IMPORT` comments to help debugging the flattened output.
//!
//! Files are read through an [`IncludeProvider`], which enables custom virtual file systems,
//! and allows build systems to track dependencies.
//!
//! The result is a single [`ExpandedText`], which also remembers the origin of every line,
//! so that compiler errors against the flattened text can be mapped back to the original
//! code (see the `compiler_log` module).
//!
//! # Example
//!
//! ```rust,no_run
//! let expanded = import_prepper::process_file(
//!     "shaders/sprite.glsl",
//!     &mut import_prepper::FileIncludeProvider,
//! );
//!
//! match expanded {
//!     Ok(expanded) => println!("{}", expanded.text),
//!     Err(err) => {
//!         eprintln!("{}", err.report());
//!         std::process::exit(1);
//!     }
//! }
//! ```

mod config;
mod error;
mod expander;
mod include_provider;
mod scanner;
mod source_map;
pub mod tracker;

#[cfg(feature = "compiler_log")]
pub mod compiler_log;

pub use config::*;
pub use error::*;
pub use expander::*;
pub use include_provider::*;
pub use source_map::*;
pub use tracker::{ExpansionState, ImportStack};

/// Process a single file, and then any code recursively imported.
///
/// `include_provider` is used to read all of the files, including the one at `file_path`.
/// Guards and deduplication are scoped to this one call.
pub fn process_file(
    file_path: impl AsRef<std::path::Path>,
    include_provider: &mut dyn IncludeProvider,
) -> Result<ExpandedText, PrepperError> {
    Expander::new(include_provider).expand(file_path)
}
