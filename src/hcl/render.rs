//! Text rendering for blocks and values
//!
//! Every nested mapping, sequence or block re-indents its already rendered
//! content by one unit, so indentation grows with nesting depth.

use std::fmt;

use indexmap::IndexMap;

use super::block::{log_warning, Block};
use super::value::Value;

/// Configuration options for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Number of spaces per nesting level
    pub indent: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indent width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// A non-fatal problem found while rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    /// Kind of the block whose heredoc map named the token
    pub block_kind: String,
    /// The heredoc token that never appeared quoted in the content
    pub token: String,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heredoc reference \"{}\" not found in {} block",
            self.token, self.block_kind
        )
    }
}

/// Rendered text together with the warnings produced along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<RenderWarning>,
}

/// Renders blocks and values, collecting warnings
pub struct Renderer {
    config: RenderConfig,
    warnings: Vec<RenderWarning>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[RenderWarning] {
        &self.warnings
    }

    /// Consume the renderer and return its warnings
    pub fn finish(self) -> Vec<RenderWarning> {
        self.warnings
    }

    fn indent_str(&self) -> String {
        " ".repeat(self.config.indent)
    }

    /// Render a value without a trailing newline
    pub fn render_value(&mut self, value: &Value) -> String {
        match value {
            Value::Map(map) => self.render_dict(map),
            Value::List(items) => self.render_list(items),
            Value::Bool(b) => b.to_string(),
            Value::Block(block) => self.render_block(block),
            Value::Raw(s) => s.clone(),
            Value::String(s) => format!("\"{}\"", s),
            Value::Int(n) => format!("\"{}\"", n),
            Value::Float(f) => format!("\"{}\"", format_float(*f)),
        }
    }

    /// Render a mapping as `{ key = value ... }`, one entry per line
    pub fn render_dict(&mut self, map: &IndexMap<String, Value>) -> String {
        let lines: Vec<String> = map
            .iter()
            .map(|(key, value)| format!("{} = {}", key, self.render_value(value)))
            .collect();
        let content = prefix_lines(&lines.join("\n"), &self.indent_str());
        format!("{{\n{}\n}}", content)
    }

    /// Render a sequence as `[ value, ... ]`, every element followed by a comma
    pub fn render_list(&mut self, items: &[Value]) -> String {
        let lines: Vec<String> = items
            .iter()
            .map(|value| format!("{},", self.render_value(value)))
            .collect();
        let content = prefix_lines(&lines.join("\n"), &self.indent_str());
        format!("[\n{}\n]", content)
    }

    /// Render a complete block
    pub fn render_block(&mut self, block: &Block) -> String {
        let mut header = block.kind().to_string();
        if let Some(subtype) = block.subtype() {
            header.push_str(&format!(" \"{}\"", subtype));
        }
        if let Some(name) = block.name() {
            header.push_str(&format!(" \"{}\"", name));
        }

        let lines: Vec<String> = block
            .attributes()
            .iter()
            .map(|(key, value)| format!("{} = {}", key, self.render_value(value)))
            .collect();

        // Children always follow the attributes
        let mut parts = vec![lines.join("\n")];
        for child in block.children() {
            parts.push(self.render_block(child));
        }

        let mut content = prefix_lines(&parts.join("\n"), &self.indent_str());

        for (token, body) in block.heredoc_map() {
            let quoted = format!("\"{}\"", token);
            if content.contains(&quoted) {
                content = content.replace(&quoted, &format!("<<EOF{}EOF", body));
            } else {
                self.warnings.push(RenderWarning {
                    block_kind: block.kind().to_string(),
                    token: token.clone(),
                });
            }
        }

        format!("{} {{\n{}\n}}", header, content)
    }
}

/// Whole floats render with a trailing `.0`; very large ones as plain digits
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Prefix every line, including empty ones
fn prefix_lines(content: &str, prefix: &str) -> String {
    content
        .split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single value with the default configuration
pub fn render_value(value: &Value) -> String {
    let mut renderer = Renderer::new(RenderConfig::default());
    let text = renderer.render_value(value);
    for warning in renderer.warnings() {
        log_warning(warning);
    }
    text
}

/// Render top-level blocks separated by a blank line
pub fn render_document(blocks: &[Block]) -> String {
    render_document_with(blocks, &RenderConfig::default())
}

/// Render top-level blocks with a custom configuration
pub fn render_document_with(blocks: &[Block], config: &RenderConfig) -> String {
    blocks
        .iter()
        .map(|block| block.render_with(config))
        .collect::<Vec<_>>()
        .join("\n\n")
}
