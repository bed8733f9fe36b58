//! Build configuration.
//!
//! A build is described by a YAML file, `tokenloom.yaml` by default. Paths
//! are relative to the directory containing it.
//!
//! ```yaml
//! base_font_size: 16
//! prefix: acme
//!
//! layers:
//!   - name: primitives
//!     kind: reference
//!     sources: [tokens/ref]
//!   - name: semantic
//!     kind: semantic
//!     sources: [tokens/sys]
//!
//! themes:
//!   - name: dark
//!     sources: [tokens/themes/dark]
//!     media: "(prefers-color-scheme: dark)"
//!
//! theme_scope:
//!   prefix: sys
//!   types: [color]
//!
//! outputs:
//!   - format: css
//!     file: dist/tokens.css
//!     output_references: true
//!   - format: ts
//!     file: dist/tokens.ts
//!     filter:
//!       tiers: [sys, cmp]
//!   - format: docs
//!     file: dist/tokens.docs.json
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::emit::{Format, TokenFilter, TypographyMode};
use crate::error::{BuildError, Result};
use crate::store::LayerKind;
use crate::theme::DiffScope;
use crate::transform::{ColorFormat, Platform, ShadowStyle, TransformOptions};

/// Configuration file looked up when none is given.
pub const DEFAULT_FILE: &str = "tokenloom.yaml";

fn default_base_font_size() -> f64 {
    16.0
}

fn default_true() -> bool {
    true
}

fn default_selector() -> String {
    ":root".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Pixels per `rem`.
    #[serde(default = "default_base_font_size")]
    pub base_font_size: f64,
    /// CSS custom property prefix.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Write the generated-file notice.
    #[serde(default = "default_true")]
    pub header: bool,
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub themes: Vec<ThemeConfig>,
    #[serde(default)]
    pub theme_scope: DiffScope,
    pub outputs: Vec<OutputConfig>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    pub name: String,
    pub kind: LayerKind,
    /// Directories or files.
    pub sources: Vec<String>,
}

impl LayerConfig {
    pub fn new(name: impl Into<String>, kind: LayerKind, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
    pub sources: Vec<String>,
    /// Defaults to `[data-theme="<name>"]`.
    #[serde(default)]
    pub selector: Option<String>,
    /// Media query the theme block is mirrored under.
    #[serde(default)]
    pub media: Option<String>,
}

impl ThemeConfig {
    pub fn new(name: impl Into<String>, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            selector: None,
            media: None,
        }
    }

    pub fn selector(&self) -> String {
        self.selector
            .clone()
            .unwrap_or_else(|| format!("[data-theme=\"{}\"]", self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub format: Format,
    /// Artifact path.
    pub file: String,
    /// Base block selector (CSS).
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Write `var()` references instead of literals (CSS).
    #[serde(default)]
    pub output_references: bool,
    /// Include theme overrides (CSS, docs, template).
    #[serde(default = "default_true")]
    pub themes: bool,
    #[serde(default)]
    pub typography: TypographyMode,
    #[serde(default)]
    pub filter: TokenFilter,
    #[serde(default)]
    pub color_format: Option<ColorFormat>,
    #[serde(default = "default_true")]
    pub rem_to_px: bool,
    #[serde(default)]
    pub shadow_style: ShadowStyle,
    /// Value representation; defaults by format.
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Template path (template outputs).
    #[serde(default)]
    pub template: Option<String>,
    /// Template contents, loaded before emission.
    #[serde(skip)]
    pub template_source: Option<String>,
}

impl OutputConfig {
    pub fn new(format: Format, file: impl Into<String>) -> Self {
        Self {
            format,
            file: file.into(),
            selector: default_selector(),
            output_references: false,
            themes: true,
            typography: TypographyMode::default(),
            filter: TokenFilter::default(),
            color_format: None,
            rem_to_px: true,
            shadow_style: ShadowStyle::default(),
            platform: None,
            template: None,
            template_source: None,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
            .unwrap_or_else(|| self.format.default_platform())
    }

    pub fn transform_options(&self, base_font_size: f64) -> TransformOptions {
        let mut options = TransformOptions::for_platform(self.platform())
            .with_base_font_size(base_font_size)
            .with_rem_to_px(self.rem_to_px)
            .with_shadow_style(self.shadow_style);
        if let Some(format) = self.color_format {
            options = options.with_color_format(format);
        }
        options
    }
}

impl BuildConfig {
    /// An empty configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            base_font_size: default_base_font_size(),
            prefix: None,
            header: true,
            layers: Vec::new(),
            themes: Vec::new(),
            theme_scope: DiffScope::default(),
            outputs: Vec::new(),
            root: root.into(),
        }
    }

    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
        self.themes.push(theme);
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.outputs.push(output);
        self
    }

    /// Parses and validates YAML.
    pub fn from_yaml(yaml: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut config: BuildConfig =
            serde_yaml::from_str(yaml).map_err(|e| BuildError::Config(e.to_string()))?;
        config.root = root.into();
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file; its directory becomes the root.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_yaml(&yaml, root)
    }

    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Paths of every configured source, layers and themes.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.layers
            .iter()
            .flat_map(|l| l.sources.iter())
            .chain(self.themes.iter().flat_map(|t| t.sources.iter()))
            .map(|s| self.resolve_path(s))
            .collect()
    }

    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.outputs
            .iter()
            .map(|o| self.resolve_path(&o.file))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(BuildError::Config(message));

        if self.base_font_size.is_nan() || self.base_font_size <= 0.0 {
            return fail(format!(
                "base_font_size must be positive, got {}",
                self.base_font_size
            ));
        }
        if self.layers.is_empty() {
            return fail("at least one layer is required".to_string());
        }
        if self.outputs.is_empty() {
            return fail("at least one output is required".to_string());
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if !names.insert(layer.name.as_str()) {
                return fail(format!("duplicate layer name '{}'", layer.name));
            }
            if layer.sources.is_empty() {
                return fail(format!("layer '{}' has no sources", layer.name));
            }
        }

        let mut themes = HashSet::new();
        for theme in &self.themes {
            if !themes.insert(theme.name.as_str()) {
                return fail(format!("duplicate theme name '{}'", theme.name));
            }
            if theme.sources.is_empty() {
                return fail(format!("theme '{}' has no sources", theme.name));
            }
        }

        let mut files = HashSet::new();
        for output in &self.outputs {
            if !files.insert(output.file.as_str()) {
                return fail(format!("duplicate output file '{}'", output.file));
            }
            if output.format == Format::Template && output.template.is_none() {
                return fail(format!(
                    "template output '{}' needs a template",
                    output.file
                ));
            }
        }
        Ok(())
    }
}
