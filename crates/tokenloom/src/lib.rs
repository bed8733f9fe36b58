//! # Tokenloom - Design Token Pipeline
//!
//! Tokenloom turns layered design-token sources into platform artifacts. It
//! provides:
//!
//! - **Layered merging** of reference, semantic, component and theme tokens
//! - **Reference resolution** with `{path.to.token}` aliases and cycle detection
//! - **Value transforms** for CSS, JavaScript and JSON consumers
//! - **Emitters** for CSS custom properties, JS/TS modules, nested JSON,
//!   a documentation catalogue and user-supplied minijinja templates
//! - **Theme diffing** so theme outputs only carry what actually changed
//!
//! ## Core Concepts
//!
//! - [`TokenDefinition`]: one token as declared in a source file
//! - [`TokenStore`]: the merged, path-ordered set of [`Token`]s
//! - [`resolve()`]: fills in resolved values and reference chains
//! - [`transform()`]: converts a resolved value for one [`Platform`]
//! - [`emit()`]: renders one output and records its identifiers in an [`OutputManifest`]
//! - [`Pipeline`]: runs all of the above from a [`BuildConfig`]
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tokenloom::{
//!     emit, resolve, EmitContext, Format, OutputConfig, OutputManifest, Token, TokenStore,
//!     TokenType,
//! };
//!
//! let store = resolve(TokenStore::from_tokens([
//!     Token::new("ref.color.blue", TokenType::Color, json!("#0055ff")),
//!     Token::new("sys.color.accent", TokenType::Color, json!("{ref.color.blue}")),
//! ]))
//! .unwrap();
//!
//! let mut manifest = OutputManifest::new();
//! let css = emit(
//!     &OutputConfig::new(Format::Css, "tokens.css"),
//!     &EmitContext::new(&store).with_header(false),
//!     &mut manifest,
//! )
//! .unwrap();
//! assert!(css.contains("--sys-color-accent: #0055ff;"));
//! ```
//!
//! ## Build Strategy
//!
//! 1. Describe layers, themes and outputs in `tokenloom.yaml` (see [`config`]).
//! 2. [`Pipeline::build`] reads sources concurrently, migrates legacy
//!    font-weight keys, merges layers in precedence order and resolves references.
//! 3. Each theme is merged over the base layers and diffed against the base store.
//! 4. Every output is rendered in memory. Any fatal error stops the build
//!    before a file is touched.
//! 5. [`write_artifacts`] writes the outputs, skipping files that did not change.

pub mod config;
pub mod emit;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod resolve;
pub mod source;
pub mod store;
pub mod theme;
pub mod token;
pub mod transform;
mod util;

pub use config::{BuildConfig, LayerConfig, OutputConfig, ThemeConfig, DEFAULT_FILE};
pub use emit::{
    emit, EmitContext, Format, OutputManifest, OutputRecord, TokenFilter, TypographyMode, HEADER,
};
pub use error::{BuildError, Result};
pub use naming::{css_variable_name, js_identifier, kebab_case};
pub use pipeline::{write_artifacts, Artifact, BuildReport, Pipeline, Sources, WriteSummary};
pub use resolve::resolve;
pub use source::{load_layer, normalize_layers, parse_token_file};
pub use store::{Layer, LayerKind, SourceFile, TokenStore};
pub use theme::{diff, DiffScope, ThemeOverrides};
pub use token::{Deprecation, Origin, ReferenceHop, Token, TokenDefinition, TokenType};
pub use transform::{
    transform, ColorFormat, Platform, ShadowStyle, TransformOptions, TransformWarning, Transformed,
};
