//! Template Engine with Tailwind Support
//!
//! A Django-inspired template engine used to render every HTML page of the
//! planner.
//!
//! Workflow:
//! 1. `render_template` loads the child template from the template directory.
//! 2. `tokenize_template` splits content into Text, Variable, and Tag tokens.
//! 3. `parse_tokens` and `parse_nodes` build an AST of `Node`.
//! 4. Child `Block` definitions and `Extends` tag are collected.
//! 5. `merge_blocks` merges child blocks into the base template, replacing all matching blocks by name.
//! 6. `render_nodes` walks the merged AST and outputs HTML, resolving variables (HTML-escaped),
//!    `if`/`if not` conditions, `for` loops (with a `forloop` helper object), and Tailwind imports via `{% tailwind %}`.
//!
//! Runtime logging is controlled via `set_display_logs`.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::router::Response;

/// Global switch for enabling/disabling internal template logs
static DISPLAY_LOGS: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{\{.*?\}\}|\{%.*?%\})").expect("valid token regex"));

/// Enable or disable internal debug logs for the template engine
pub fn set_display_logs(enabled: bool) {
    DISPLAY_LOGS.store(enabled, Ordering::Relaxed);
}

/// Internal debug: logs only if DISPLAY_LOGS is true
macro_rules! tdebug {
    ($($arg:tt)+) => {
        if DISPLAY_LOGS.load(Ordering::Relaxed) {
            debug!($($arg)+);
        }
    }
}

/// Supported value types for template context
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    Null,
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<TemplateValue>),
    Object(HashMap<String, TemplateValue>),
}

pub type Context = HashMap<String, TemplateValue>;

impl TemplateValue {
    /// Convert the value to a string for rendering
    pub fn as_string(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::Number(n) => n.to_string(),
            TemplateValue::Null | TemplateValue::List(_) | TemplateValue::Object(_) => {
                String::new()
            }
        }
    }

    /// Truthiness used by `{% if %}`: empty strings, empty collections, zero and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => *n != 0.0,
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Object(map) => !map.is_empty(),
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<serde_json::Value> for TemplateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(b),
            serde_json::Value::Number(n) => TemplateValue::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => TemplateValue::String(s),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            serde_json::Value::Object(map) => TemplateValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Convert any serializable value (a model row, a list of rows) into a template value.
pub fn to_value<T: Serialize>(value: &T) -> TemplateValue {
    match serde_json::to_value(value) {
        Ok(v) => TemplateValue::from(v),
        Err(e) => {
            log::error!("Failed to convert value for template context: {}", e);
            TemplateValue::Null
        }
    }
}

/// Escape text for safe inclusion in HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Token types extracted from the template
#[derive(Debug, Clone)]
pub enum Token {
    Text(String),     // Plain text
    Variable(String), // {{ variable }}
    Tag(String),      // {% tag %}
}

/// AST node types for the template engine
#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Variable(String),
    If {
        condition: String,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    For {
        var_name: String,
        list_name: String,
        body: Vec<Node>,
    },
    Block {
        name: String,
        body: Vec<Node>,
    },
    Extends(String), // {% extends "base.html" %}
    Tailwind,        // {% tailwind %}
}

/// Tokenizes the template content into a Vec<Token>
pub fn tokenize_template(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    for mat in TOKEN_RE.find_iter(content) {
        let start = mat.start();
        let end = mat.end();
        if start > last_end {
            tokens.push(Token::Text(content[last_end..start].to_string()));
        }
        let m = mat.as_str().trim();
        if m.starts_with("{{") {
            let inner = m
                .trim_start_matches("{{")
                .trim_end_matches("}}")
                .trim()
                .to_string();
            tdebug!("tokenize: Variable '{{ {{ {} }} }}'", inner);
            tokens.push(Token::Variable(inner));
        } else {
            let inner = m
                .trim_start_matches("{%")
                .trim_end_matches("%}")
                .trim()
                .to_string();
            tdebug!("tokenize: Tag '{{% {} %}}'", inner);
            tokens.push(Token::Tag(inner));
        }
        last_end = end;
    }
    if last_end < content.len() {
        tokens.push(Token::Text(content[last_end..].to_string()));
    }
    tokens
}

/// Parses a sequence of Token into an AST of Node
pub fn parse_tokens(tokens: &[Token]) -> Vec<Node> {
    let mut idx = 0;
    parse_nodes(tokens, &mut idx, &[])
}

/// Recursive parser: consumes tokens until an `end_tag` is found
fn parse_nodes(tokens: &[Token], idx: &mut usize, end_tags: &[&str]) -> Vec<Node> {
    let mut nodes = Vec::new();
    while *idx < tokens.len() {
        match &tokens[*idx] {
            Token::Text(t) => {
                nodes.push(Node::Text(t.clone()));
                *idx += 1;
            }
            Token::Variable(v) => {
                nodes.push(Node::Variable(v.clone()));
                *idx += 1;
            }
            Token::Tag(tag) => {
                let t = tag.trim();
                if end_tags.contains(&t) {
                    break;
                }
                if let Some(rest) = t.strip_prefix("extends ") {
                    nodes.push(Node::Extends(
                        rest.trim().trim_matches('"').trim_matches('\'').to_string(),
                    ));
                    *idx += 1;
                    continue;
                }
                if let Some(name) = t.strip_prefix("block ") {
                    *idx += 1;
                    let body = parse_nodes(tokens, idx, &["endblock"]);
                    *idx += 1; // skip endblock
                    nodes.push(Node::Block {
                        name: name.trim().to_string(),
                        body,
                    });
                    continue;
                }
                if let Some(cond) = t.strip_prefix("if ") {
                    *idx += 1;
                    let then_body = parse_nodes(tokens, idx, &["else", "endif"]);
                    let mut else_body = Vec::new();
                    if let Some(Token::Tag(tt)) = tokens.get(*idx) {
                        if tt.trim() == "else" {
                            *idx += 1;
                            else_body = parse_nodes(tokens, idx, &["endif"]);
                        }
                    }
                    *idx += 1; // skip endif
                    nodes.push(Node::If {
                        condition: cond.trim().to_string(),
                        then_body,
                        else_body,
                    });
                    continue;
                }
                if let Some(rest) = t.strip_prefix("for ") {
                    let parts: Vec<&str> = rest.split_whitespace().collect();
                    if parts.len() == 3 && parts[1] == "in" {
                        *idx += 1;
                        let body = parse_nodes(tokens, idx, &["endfor"]);
                        *idx += 1; // skip endfor
                        nodes.push(Node::For {
                            var_name: parts[0].to_string(),
                            list_name: parts[2].to_string(),
                            body,
                        });
                        continue;
                    }
                }
                if t == "tailwind" {
                    nodes.push(Node::Tailwind);
                    *idx += 1;
                    continue;
                }
                tdebug!("parse: skipping unknown tag '{}'", t);
                *idx += 1;
            }
        }
    }
    nodes
}

/// Resolves a dotted variable path 'a.b.c' within the context
fn resolve_variable<'a>(name: &str, context: &'a Context) -> Option<&'a TemplateValue> {
    let mut current: Option<&TemplateValue> = None;
    for (i, key) in name.split('.').enumerate() {
        if i == 0 {
            current = context.get(key);
        } else if let Some(TemplateValue::Object(map)) = current {
            current = map.get(key);
        } else {
            return None;
        }
    }
    current
}

fn evaluate_condition(condition: &str, context: &Context) -> bool {
    match condition.strip_prefix("not ") {
        Some(inner) => !evaluate_condition(inner.trim(), context),
        None => resolve_variable(condition, context)
            .map(TemplateValue::is_truthy)
            .unwrap_or(false),
    }
}

/// Merges child blocks into base AST by matching block names
fn merge_blocks(nodes: &[Node], child_blocks: &HashMap<String, Vec<Node>>) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Block { name, body } => match child_blocks.get(name) {
                Some(child) => Node::Block {
                    name: name.clone(),
                    body: child.clone(),
                },
                None => Node::Block {
                    name: name.clone(),
                    body: merge_blocks(body, child_blocks),
                },
            },
            Node::If {
                condition,
                then_body,
                else_body,
            } => Node::If {
                condition: condition.clone(),
                then_body: merge_blocks(then_body, child_blocks),
                else_body: merge_blocks(else_body, child_blocks),
            },
            Node::For {
                var_name,
                list_name,
                body,
            } => Node::For {
                var_name: var_name.clone(),
                list_name: list_name.clone(),
                body: merge_blocks(body, child_blocks),
            },
            other => other.clone(),
        })
        .collect()
}

fn forloop_value(index: usize, len: usize) -> TemplateValue {
    let mut map = HashMap::new();
    map.insert("counter".to_string(), TemplateValue::Number((index + 1) as f64));
    map.insert("counter0".to_string(), TemplateValue::Number(index as f64));
    map.insert("first".to_string(), TemplateValue::Bool(index == 0));
    map.insert("last".to_string(), TemplateValue::Bool(index + 1 == len));
    TemplateValue::Object(map)
}

/// Renders the AST into HTML string using the context
pub fn render_nodes(nodes: &[Node], context: &Context) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Variable(name) => {
                if let Some(val) = resolve_variable(name, context) {
                    out.push_str(&escape_html(&val.as_string()));
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                if evaluate_condition(condition, context) {
                    out.push_str(&render_nodes(then_body, context));
                } else {
                    out.push_str(&render_nodes(else_body, context));
                }
            }
            Node::For {
                var_name,
                list_name,
                body,
            } => {
                if let Some(TemplateValue::List(items)) = resolve_variable(list_name, context) {
                    let len = items.len();
                    for (i, item) in items.iter().enumerate() {
                        let mut local = context.clone();
                        local.insert(var_name.clone(), item.clone());
                        local.insert("forloop".to_string(), forloop_value(i, len));
                        out.push_str(&render_nodes(body, &local));
                    }
                }
            }
            Node::Block { body, .. } => {
                out.push_str(&render_nodes(body, context));
            }
            Node::Extends(_) => {}
            Node::Tailwind => {
                tdebug!("Inserting Tailwind CDN link");
                out.push_str(r#"<script src="https://cdn.tailwindcss.com"></script>"#);
            }
        }
    }
    out
}

fn html_response(status_code: u16, body: String) -> Response {
    let mut response = Response::status(status_code, body);
    response.headers.insert(
        "Content-Type".to_string(),
        "text/html; charset=utf-8".to_string(),
    );
    response
}

/// Main entry: loads the child template from `dir`, merges it with its base, and renders HTML
pub fn render_template(dir: impl AsRef<Path>, template_name: &str, context: &Context) -> Response {
    let dir = dir.as_ref();
    let child = match std::fs::read_to_string(dir.join(template_name)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Template '{}' could not be loaded: {}", template_name, e);
            return html_response(404, format!("Template '{}' not found", template_name));
        }
    };
    let child_nodes = parse_tokens(&tokenize_template(&child));
    tdebug!("Child AST: {:?}", child_nodes);

    // Collect child blocks and detect base
    let mut child_blocks = HashMap::new();
    let mut base_t: Option<String> = None;
    for node in &child_nodes {
        if let Node::Extends(b) = node {
            base_t = Some(b.clone());
        }
        if let Node::Block { name, body } = node {
            child_blocks.insert(name.clone(), body.clone());
        }
    }

    let html = match base_t {
        Some(base) => {
            let base_content = match std::fs::read_to_string(dir.join(&base)) {
                Ok(c) => c,
                Err(e) => {
                    log::error!(
                        "Base template '{}' of '{}' could not be loaded: {}",
                        base,
                        template_name,
                        e
                    );
                    return html_response(404, format!("Template '{}' not found", base));
                }
            };
            let base_nodes = parse_tokens(&tokenize_template(&base_content));
            tdebug!("Base AST: {:?}", base_nodes);
            let merged = merge_blocks(&base_nodes, &child_blocks);
            tdebug!("Merged AST: {:?}", merged);
            render_nodes(&merged, context)
        }
        None => {
            let merged = merge_blocks(&child_nodes, &child_blocks);
            render_nodes(&merged, context)
        }
    };

    html_response(200, html)
}
