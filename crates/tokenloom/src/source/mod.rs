//! Reading token sources: file discovery, JSON tree parsing and the
//! pre-merge normalization pass.

pub mod file_loader;
pub mod normalize;
pub mod parser;

pub use file_loader::{discover, load_layer, read_sources, LoadedFile, TOKEN_EXTENSIONS};
pub use normalize::{normalize_layers, semantic_weight_name};
pub use parser::{parse_token_file, parse_token_tree};
