//! Extraction of translatable source strings from PHP and Blade files.
//!
//! Files are discovered under configured roots, Blade templates are compiled
//! to PHP, and the tree-sitter PHP grammar is walked for calls to the
//! configured translation functions.

pub mod blade;
pub mod discovery;
pub mod extract;
pub mod file_kind;
pub mod treesitter;

pub use blade::{BladeCompiler, TemplateCompiler};
pub use discovery::{list_files, list_roots};
pub use extract::{ExtractError, SourceExtractor};
pub use file_kind::FileKind;
