//! Custom formats rendered with minijinja.
//!
//! The template sees:
//!
//! * `tokens`: every selected token, with the documentation fields
//!   (`path`, `name`, `type`, `value`, `resolvedValue`, `cssVariable`, ...)
//!   plus `tier` and `text`, the value rendered as plain text;
//! * `themes`: `name`, `selector`, `media` and the overriding `tokens`;
//! * `header`: the generated-file notice, or nothing when headers are off.
//!
//! Two filters are registered: `css_var` and `js_name` turn a token path into
//! the identifier the CSS and JS outputs use.
//!
//! ```jinja
//! {% for t in tokens %}{{ t.path | js_name }} = {{ t.text }}
//! {% endfor %}
//! ```

use minijinja::Environment;
use serde::Serialize;

use super::css::css_text;
use super::docs::DocumentationEntry;
use super::manifest::OutputRecord;
use super::{selected_themes, transformed_value, EmitContext, HEADER};
use crate::config::OutputConfig;
use crate::error::{BuildError, Result};
use crate::naming::{css_variable_name, js_identifier};
use crate::token::Token;
use crate::transform::TransformOptions;

#[derive(Serialize)]
struct TemplateToken {
    #[serde(flatten)]
    entry: DocumentationEntry,
    tier: String,
    text: String,
}

#[derive(Serialize)]
struct TemplateTheme<'a> {
    name: &'a str,
    selector: &'a str,
    media: Option<&'a str>,
    tokens: Vec<TemplateToken>,
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    tokens: Vec<TemplateToken>,
    themes: Vec<TemplateTheme<'a>>,
    header: Option<&'static str>,
}

fn template_token(
    token: &Token,
    options: &TransformOptions,
    ctx: &EmitContext<'_>,
    record: &mut OutputRecord,
) -> TemplateToken {
    let value = transformed_value(token, options, record);
    let text = css_text(&value);
    TemplateToken {
        entry: DocumentationEntry::from_token(token, value, ctx.css_prefix),
        tier: token.tier().to_string(),
        text,
    }
}

pub fn emit_template(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<String> {
    let name = output.template.clone().unwrap_or_else(|| output.file.clone());
    let template_error = |message: String| BuildError::Template {
        name: name.clone(),
        message,
    };
    let source = output
        .template_source
        .as_deref()
        .ok_or_else(|| template_error("template source was not loaded".to_string()))?;

    let mut tokens = Vec::new();
    for token in ctx.selected(output) {
        record.map(&token.path, &token.path)?;
        tokens.push(template_token(token, options, ctx, record));
    }
    let themes = selected_themes(output, ctx)
        .into_iter()
        .map(|(theme, theme_tokens)| TemplateTheme {
            name: &theme.name,
            selector: &theme.selector,
            media: theme.media.as_deref(),
            tokens: theme_tokens
                .into_iter()
                .map(|t| template_token(t, options, ctx, record))
                .collect(),
        })
        .collect();

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    let prefix = ctx.css_prefix.map(String::from);
    env.add_filter("css_var", move |path: String| {
        css_variable_name(&path, prefix.as_deref())
    });
    env.add_filter("js_name", |path: String| js_identifier(&path));

    env.add_template_owned(name.clone(), source.to_string())
        .map_err(|e| template_error(e.to_string()))?;
    let tmpl = env
        .get_template(&name)
        .map_err(|e| template_error(e.to_string()))?;

    tmpl.render(&TemplateContext {
        tokens,
        themes,
        header: ctx.header.then_some(HEADER),
    })
    .map_err(|e| template_error(e.to_string()))
}
