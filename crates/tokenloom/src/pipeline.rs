//! The build pipeline.
//!
//! ```text
//! read (concurrent) -> normalize -> merge -> resolve -> diff themes -> emit -> write
//! ```
//!
//! Every stage completes before the next starts. The first fatal error stops
//! the build, and nothing is written until every output has rendered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{BuildConfig, ThemeConfig};
use crate::emit::{emit, EmitContext, Format, OutputManifest};
use crate::error::{BuildError, Result};
use crate::resolve::resolve;
use crate::source::{load_layer, normalize_layers};
use crate::store::{Layer, LayerKind, TokenStore};
use crate::theme::{diff, ThemeOverrides};

/// A rendered output, not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub format: Format,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub artifacts: Vec<Artifact>,
    pub manifest: OutputManifest,
    /// Tokens in the base store.
    pub token_count: usize,
    pub themes: Vec<ThemeOverrides>,
    /// Legacy font-weight keys renamed during normalization.
    pub migrated: Vec<(String, String)>,
}

impl BuildReport {
    pub fn artifact(&self, path: &Path) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Everything read from disk for one build.
#[derive(Debug, Clone)]
pub struct Sources {
    pub layers: Vec<Layer>,
    /// One layer per configured theme, in configuration order.
    pub themes: Vec<Layer>,
    /// Template contents by output file.
    pub templates: HashMap<String, String>,
}

pub struct Pipeline {
    config: BuildConfig,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(BuildConfig::load(path)?))
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    fn labelled(&self, sources: &[String]) -> Vec<(String, PathBuf)> {
        sources
            .iter()
            .map(|s| (s.clone(), self.config.resolve_path(s)))
            .collect()
    }

    /// Reads every layer, theme and template.
    pub fn load_sources(&self) -> Result<Sources> {
        let layers = self
            .config
            .layers
            .iter()
            .map(|layer| load_layer(&layer.name, layer.kind, &self.labelled(&layer.sources)))
            .collect::<Result<Vec<_>>>()?;

        let themes = self
            .config
            .themes
            .iter()
            .map(|theme| load_layer(&theme.name, LayerKind::Theme, &self.labelled(&theme.sources)))
            .collect::<Result<Vec<_>>>()?;

        let mut templates = HashMap::new();
        for output in &self.config.outputs {
            if let Some(template) = &output.template {
                let path = self.config.resolve_path(template);
                let source =
                    std::fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
                templates.insert(output.file.clone(), source);
            }
        }

        Ok(Sources {
            layers,
            themes,
            templates,
        })
    }

    fn theme_overrides(
        &self,
        base: &TokenStore,
        base_layers: &[Layer],
        config: &ThemeConfig,
        layer: Layer,
    ) -> Result<ThemeOverrides> {
        let mut layers = base_layers.to_vec();
        layers.push(layer);
        let themed = resolve(TokenStore::merge(&layers)?)?;
        let tokens = diff(base, &themed, &self.config.theme_scope);
        let overrides = ThemeOverrides {
            name: config.name.clone(),
            selector: config.selector(),
            media: config.media.clone(),
            tokens,
        };
        if overrides.is_empty() {
            tracing::info!(theme = %config.name, "theme changes nothing in scope");
        } else {
            tracing::debug!(theme = %config.name, overrides = overrides.tokens.len(), "diffed theme");
        }
        Ok(overrides)
    }

    /// Merges, resolves and renders already loaded sources.
    pub fn compile(&self, sources: Sources) -> Result<BuildReport> {
        let base_count = sources.layers.len();
        let mut layers = sources.layers;
        layers.extend(sources.themes);
        let migrated = normalize_layers(&mut layers);
        let theme_layers = layers.split_off(base_count);

        let base = resolve(TokenStore::merge(&layers)?)?;
        tracing::info!(tokens = base.len(), layers = layers.len(), "resolved token store");

        let themes = self
            .config
            .themes
            .iter()
            .zip(theme_layers)
            .map(|(config, layer)| self.theme_overrides(&base, &layers, config, layer))
            .collect::<Result<Vec<_>>>()?;

        let ctx = EmitContext::new(&base)
            .with_themes(&themes)
            .with_css_prefix(self.config.prefix.as_deref())
            .with_header(self.config.header)
            .with_base_font_size(self.config.base_font_size);

        let mut manifest = OutputManifest::new();
        let mut artifacts = Vec::with_capacity(self.config.outputs.len());
        for output in &self.config.outputs {
            let mut output = output.clone();
            if output.template_source.is_none() {
                output.template_source = sources.templates.get(&output.file).cloned();
            }
            let contents = emit(&output, &ctx, &mut manifest)?;
            artifacts.push(Artifact {
                path: self.config.resolve_path(&output.file),
                format: output.format,
                contents,
            });
        }

        tracing::info!(
            outputs = artifacts.len(),
            warnings = manifest.warning_count(),
            "rendered outputs"
        );
        let token_count = base.len();
        Ok(BuildReport {
            artifacts,
            manifest,
            token_count,
            themes,
            migrated,
        })
    }

    /// Loads and compiles without touching the output files.
    pub fn build(&self) -> Result<BuildReport> {
        let sources = self.load_sources()?;
        self.compile(sources)
    }

    /// Builds and writes every artifact.
    pub fn run(&self) -> Result<(BuildReport, WriteSummary)> {
        let report = self.build()?;
        let summary = write_artifacts(&report.artifacts)?;
        Ok((report, summary))
    }
}

/// Writes artifacts, skipping files whose contents are unchanged.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    for artifact in artifacts {
        let current = std::fs::read_to_string(&artifact.path).ok();
        if current.as_deref() == Some(artifact.contents.as_str()) {
            tracing::debug!(path = %artifact.path.display(), "unchanged");
            summary.unchanged.push(artifact.path.clone());
            continue;
        }
        if let Some(parent) = artifact.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        std::fs::write(&artifact.path, &artifact.contents)
            .map_err(|e| BuildError::io(&artifact.path, e))?;
        tracing::info!(path = %artifact.path.display(), "wrote");
        summary.written.push(artifact.path.clone());
    }
    Ok(summary)
}
