//! Prompt template rendering.
//!
//! Turns a validated input object into the exact instruction string sent
//! to the model. Supports scalar interpolation (`{{field}}`), conditional
//! blocks (`{{#if field}}...{{/if}}`, rendered only when the field is
//! present and non-empty), and bounded iteration (`{{#each field}}` with
//! `{{@index}}` starting at 1 and `{{this}}` for the element).
//!
//! Both parsing and rendering are total: malformed directives render as
//! literal text, unknown fields render as empty strings. Once an input
//! has passed schema validation, rendering can never fail.

use serde_json::{Map, Value};

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Var(String),
    Index,
    This,
    Cond { field: String, body: Vec<Segment> },
    Each { field: String, body: Vec<Segment> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Each,
}

/// A parsed prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse template source. Total: anything that does not form a valid
    /// directive stays in the output verbatim.
    pub fn parse(src: &str) -> Self {
        // Stack of open blocks: the raw opening tag (kept so an unclosed
        // block can fall back to literal text), the block kind, the field
        // name, and the segments accumulated before the block opened.
        let mut stack: Vec<(String, BlockKind, String, Vec<Segment>)> = Vec::new();
        let mut current: Vec<Segment> = Vec::new();

        let mut rest = src;
        while let Some(start) = rest.find("{{") {
            let (before, tagged) = rest.split_at(start);
            if !before.is_empty() {
                current.push(Segment::Text(before.to_string()));
            }
            let Some(end) = tagged.find("}}") else {
                // Unterminated tag: everything left is text.
                current.push(Segment::Text(tagged.to_string()));
                rest = "";
                break;
            };
            let raw = &tagged[..end + 2];
            let inner = tagged[2..end].trim();
            rest = &tagged[end + 2..];

            if let Some(field) = inner.strip_prefix("#if ") {
                stack.push((
                    raw.to_string(),
                    BlockKind::If,
                    field.trim().to_string(),
                    std::mem::take(&mut current),
                ));
            } else if let Some(field) = inner.strip_prefix("#each ") {
                stack.push((
                    raw.to_string(),
                    BlockKind::Each,
                    field.trim().to_string(),
                    std::mem::take(&mut current),
                ));
            } else if inner == "/if" || inner == "/each" {
                let wanted = if inner == "/if" {
                    BlockKind::If
                } else {
                    BlockKind::Each
                };
                if stack.last().map(|(_, kind, _, _)| *kind) == Some(wanted) {
                    if let Some((_, kind, field, mut parent)) = stack.pop() {
                        let body = std::mem::take(&mut current);
                        let block = match kind {
                            BlockKind::If => Segment::Cond { field, body },
                            BlockKind::Each => Segment::Each { field, body },
                        };
                        parent.push(block);
                        current = parent;
                    }
                } else {
                    // Stray close tag: keep it as text.
                    current.push(Segment::Text(raw.to_string()));
                }
            } else if inner == "@index" {
                current.push(Segment::Index);
            } else if inner == "this" {
                current.push(Segment::This);
            } else if !inner.is_empty() && inner.chars().all(|c| c.is_alphanumeric() || c == '_') {
                current.push(Segment::Var(inner.to_string()));
            } else {
                current.push(Segment::Text(raw.to_string()));
            }
        }
        if !rest.is_empty() {
            current.push(Segment::Text(rest.to_string()));
        }

        // Unclosed blocks degrade to literal text followed by their body.
        while let Some((raw, _, _, mut parent)) = stack.pop() {
            parent.push(Segment::Text(raw));
            parent.extend(current);
            current = parent;
        }

        Self { segments: current }
    }

    /// Render against a validated input object. Pure and total.
    pub fn render(&self, input: &Map<String, Value>) -> String {
        let mut out = String::new();
        render_segments(&self.segments, input, None, &mut out);
        out
    }
}

fn render_segments(
    segments: &[Segment],
    input: &Map<String, Value>,
    element: Option<(&Value, usize)>,
    out: &mut String,
) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Var(name) => out.push_str(&scalar_text(input.get(name.as_str()))),
            Segment::Index => {
                if let Some((_, index)) = element {
                    out.push_str(&(index + 1).to_string());
                }
            }
            Segment::This => {
                if let Some((value, _)) = element {
                    out.push_str(&scalar_text(Some(value)));
                }
            }
            Segment::Cond { field, body } => {
                if is_present(input.get(field.as_str())) {
                    render_segments(body, input, element, out);
                }
            }
            Segment::Each { field, body } => {
                if let Some(Value::Array(items)) = input.get(field.as_str()) {
                    for (index, item) in items.iter().enumerate() {
                        render_segments(body, input, Some((item, index)), out);
                    }
                }
            }
        }
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_scalar_interpolation_verbatim() {
        let template = PromptTemplate::parse("Item: {{title}}, asking {{price}} EUR.");
        let rendered = template.render(&input(json!({ "title": "ThinkPad X230", "price": 140 })));
        assert_eq!(rendered, "Item: ThinkPad X230, asking 140 EUR.");
    }

    #[test]
    fn test_conditional_renders_only_when_present() {
        let template = PromptTemplate::parse("Desc.{{#if notes}} Seller notes: {{notes}}{{/if}}");
        let with = template.render(&input(json!({ "notes": "screen scratched" })));
        assert_eq!(with, "Desc. Seller notes: screen scratched");

        let without = template.render(&input(json!({})));
        assert_eq!(without, "Desc.");

        let empty = template.render(&input(json!({ "notes": "" })));
        assert_eq!(empty, "Desc.");
    }

    #[test]
    fn test_each_with_one_based_index() {
        let template = PromptTemplate::parse("{{#each photos}}Image {{@index}}: {{this}}\n{{/each}}");
        let rendered = template.render(&input(json!({ "photos": ["a", "b"] })));
        assert_eq!(rendered, "Image 1: a\nImage 2: b\n");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let template = PromptTemplate::parse("Hello {{name}}!");
        assert_eq!(template.render(&input(json!({}))), "Hello !");
    }

    #[test]
    fn test_malformed_directives_stay_literal() {
        let template = PromptTemplate::parse("{{#if notes}}open forever");
        assert_eq!(
            template.render(&input(json!({ "notes": "x" }))),
            "{{#if notes}}open forever"
        );

        let template = PromptTemplate::parse("stray {{/if}} close and {{bad name}} tag");
        assert_eq!(
            template.render(&input(json!({}))),
            "stray {{/if}} close and {{bad name}} tag"
        );

        let template = PromptTemplate::parse("unterminated {{title");
        assert_eq!(template.render(&input(json!({}))), "unterminated {{title");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template =
            PromptTemplate::parse("{{#each photos}}[{{@index}}] {{this}} {{/each}}{{title}}");
        let data = input(json!({ "photos": ["x", "y", "z"], "title": "Camera" }));
        assert_eq!(template.render(&data), template.render(&data));
    }
}
