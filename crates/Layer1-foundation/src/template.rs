//! Replica templates
//!
//! Argument and environment strings may embed `{{index}}`, which is replaced
//! by the replica index when a task is launched. Templates are parsed once at
//! configuration time so rendering itself cannot fail.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// The only variable available to templates
pub const INDEX_VAR: &str = "index";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("placeholder regex is valid"))
}

/// Values substituted into a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateContext {
    pub index: usize,
}

impl TemplateContext {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Index,
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting unknown variables and unclosed placeholders
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in placeholder_regex().captures_iter(source) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            Self::push_literal(source, &source[cursor..whole.start()], &mut segments)?;

            let name = inner.as_str().trim();
            if name != INDEX_VAR {
                return Err(Error::template(
                    source,
                    format!("unknown variable '{}' (only '{}' is available)", name, INDEX_VAR),
                ));
            }
            segments.push(Segment::Index);
            cursor = whole.end();
        }
        Self::push_literal(source, &source[cursor..], &mut segments)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn push_literal(source: &str, text: &str, segments: &mut Vec<Segment>) -> Result<()> {
        if text.contains("{{") {
            return Err(Error::template(source, "unclosed placeholder"));
        }
        if !text.is_empty() {
            segments.push(Segment::Literal(text.to_string()));
        }
        Ok(())
    }

    /// Render with the given context
    pub fn render(&self, ctx: &TemplateContext) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Index => out.push_str(&ctx.index.to_string()),
            }
        }
        out
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse and render in one step
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    Ok(Template::parse(template)?.render(ctx))
}
