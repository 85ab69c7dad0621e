//! Recursive document renderer.
//!
//! Flattens an arbitrary nested JSON tree (designed for insight records,
//! but general) into an ordered sequence of typed [`RenderBlock`]s for an
//! external layout stage. Values without meaningful content are skipped
//! entirely so empty report sections never appear.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{BlockKind, RenderBlock};

/// Recursion ceiling for pathological trees; a well-formed insight record
/// is a handful of levels deep.
const MAX_DEPTH: usize = 64;

/// Render a nested tree into a flat, order-preserving block sequence.
///
/// Entries of a top-level record become section headers whose content
/// starts back at depth 0; only nesting below a section consumes indent
/// levels.
pub fn render(tree: &Value) -> Result<Vec<RenderBlock>> {
    let mut blocks = Vec::new();
    match tree {
        Value::Object(map) => {
            for (key, entry) in map {
                render_entry(key, entry, 0, 0, &mut blocks)?;
            }
        }
        other => render_value(other, 0, &mut blocks)?,
    }
    Ok(blocks)
}

/// Render one mapping entry: a header plus recursive content for composite
/// values, a labeled leaf for scalars.
fn render_entry(
    key: &str,
    entry: &Value,
    depth: usize,
    child_depth: usize,
    blocks: &mut Vec<RenderBlock>,
) -> Result<()> {
    if !is_meaningful(entry) {
        return Ok(());
    }
    let label = title_case(key);
    if entry.is_object() || entry.is_array() {
        blocks.push(RenderBlock {
            depth,
            label: Some(label),
            text: String::new(),
            kind: BlockKind::Header,
            numeric: false,
        });
        render_value(entry, child_depth, blocks)?;
    } else {
        let (text, numeric) = format_scalar(entry);
        blocks.push(RenderBlock {
            depth,
            label: Some(label),
            text,
            kind: BlockKind::Leaf,
            numeric,
        });
    }
    Ok(())
}

fn render_value(value: &Value, depth: usize, blocks: &mut Vec<RenderBlock>) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::Render(format!(
            "tree exceeds maximum nesting depth of {}",
            MAX_DEPTH
        )));
    }

    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                render_entry(key, entry, depth, depth + 1, blocks)?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if !is_meaningful(item) {
                    continue;
                }
                if item.is_object() || item.is_array() {
                    // Item labels only for nested lists; top-level list
                    // elements render unnumbered.
                    if depth > 0 {
                        blocks.push(RenderBlock {
                            depth,
                            label: Some(format!("Item {}", i + 1)),
                            text: String::new(),
                            kind: BlockKind::Header,
                            numeric: false,
                        });
                    }
                    render_value(item, depth + 1, blocks)?;
                } else {
                    let (text, numeric) = format_scalar(item);
                    blocks.push(RenderBlock {
                        depth,
                        label: None,
                        text,
                        kind: BlockKind::Bullet,
                        numeric,
                    });
                }
            }
        }
        scalar => {
            if is_meaningful(scalar) {
                let (text, numeric) = format_scalar(scalar);
                blocks.push(RenderBlock {
                    depth,
                    label: None,
                    text,
                    kind: BlockKind::Leaf,
                    numeric,
                });
            }
        }
    }

    Ok(())
}

/// A value is meaningful iff it is not null, not an empty or
/// whitespace-only string, and not an empty array/object.
fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Title-case a record key: underscores become spaces and each word is
/// capitalized (`current_health_status` → `Current Health Status`).
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a scalar to display text with its numeric emphasis flag. Unknown
/// scalar shapes stringify rather than fail.
fn format_scalar(value: &Value) -> (String, bool) {
    match value {
        Value::Number(n) => (n.to_string(), true),
        Value::String(s) => (s.clone(), is_numeric_string(s)),
        Value::Bool(b) => (b.to_string(), false),
        other => (other.to_string(), false),
    }
}

/// A string gets numeric emphasis when it is composed solely of digits,
/// at most one decimal point, and at most one leading minus sign.
fn is_numeric_string(s: &str) -> bool {
    let s = s.trim();
    let body = s.strip_prefix('-').unwrap_or(s);
    if body.is_empty() {
        return false;
    }
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meaningless_values_emit_no_blocks() {
        let blocks = render(&json!({"a": "", "b": [], "c": null, "d": "x"})).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label.as_deref(), Some("D"));
        assert_eq!(blocks[0].text, "x");
        assert_eq!(blocks[0].kind, BlockKind::Leaf);
    }

    #[test]
    fn keys_are_title_cased() {
        let blocks = render(&json!({"current_health_status": "Stable"})).unwrap();
        assert_eq!(blocks[0].label.as_deref(), Some("Current Health Status"));
        assert_eq!(blocks[0].text, "Stable");
    }

    #[test]
    fn numeric_strings_get_emphasis() {
        let blocks = render(&json!({"a": "5.97", "b": "hello"})).unwrap();
        assert!(blocks[0].numeric);
        assert!(!blocks[1].numeric);
    }

    #[test]
    fn numeric_string_shapes() {
        assert!(is_numeric_string("42"));
        assert!(is_numeric_string("5.97"));
        assert!(is_numeric_string("-3.5"));
        assert!(!is_numeric_string("1.2.3"));
        assert!(!is_numeric_string("12-3"));
        assert!(!is_numeric_string("-"));
        assert!(!is_numeric_string("."));
        assert!(!is_numeric_string("5 mg"));
        assert!(!is_numeric_string(""));
    }

    #[test]
    fn json_numbers_get_emphasis() {
        let blocks = render(&json!({"age": 56})).unwrap();
        assert!(blocks[0].numeric);
        assert_eq!(blocks[0].text, "56");
    }

    #[test]
    fn composite_entries_become_headers_with_children() {
        let blocks = render(&json!({
            "test_results": { "blood_test": "normal" }
        }))
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Header);
        assert_eq!(blocks[0].label.as_deref(), Some("Test Results"));
        assert_eq!(blocks[0].depth, 0);
        assert_eq!(blocks[1].kind, BlockKind::Leaf);
        assert_eq!(blocks[1].label.as_deref(), Some("Blood Test"));
        // Section content starts back at depth 0 under the section header.
        assert_eq!(blocks[1].depth, 0);
    }

    #[test]
    fn scalar_list_elements_become_bullets() {
        let blocks = render(&json!({"recommendations": ["rest", "hydrate"]})).unwrap();
        assert_eq!(blocks[0].kind, BlockKind::Header);
        assert_eq!(blocks[1].kind, BlockKind::Bullet);
        assert_eq!(blocks[1].text, "rest");
        assert_eq!(blocks[2].text, "hydrate");
    }

    #[test]
    fn section_list_entries_are_unnumbered() {
        // A list that is the direct value of a top-level key renders its
        // composite entries without Item labels.
        let blocks = render(&json!({
            "timeline": [
                {"date": "2025-02-11", "event": "Blood test"},
                {"date": "2025-03-01", "event": "Follow-up"}
            ]
        }))
        .unwrap();
        let labels: Vec<_> = blocks.iter().filter_map(|b| b.label.as_deref()).collect();
        assert!(!labels.iter().any(|l| l.starts_with("Item ")));
        assert!(labels.contains(&"Timeline"));
        assert!(labels.contains(&"Date"));
        // Entry fields sit one level under the section content.
        let date = blocks
            .iter()
            .find(|b| b.label.as_deref() == Some("Date"))
            .unwrap();
        assert_eq!(date.depth, 1);
    }

    #[test]
    fn deeply_nested_composite_list_items_get_item_labels() {
        let blocks = render(&json!({
            "test_results": {
                "panels": [
                    {"name": "CBC"},
                    {"name": "CMP"}
                ]
            }
        }))
        .unwrap();
        let labels: Vec<_> = blocks.iter().filter_map(|b| b.label.as_deref()).collect();
        assert!(labels.contains(&"Item 1"));
        assert!(labels.contains(&"Item 2"));
    }

    #[test]
    fn top_level_list_items_are_unnumbered() {
        let blocks = render(&json!([{"a": "x"}, {"b": "y"}])).unwrap();
        assert!(blocks.iter().all(|b| {
            b.label.as_deref().map_or(true, |l| !l.starts_with("Item "))
        }));
    }

    #[test]
    fn top_level_scalar_renders_as_leaf() {
        let blocks = render(&json!("just text")).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Leaf);
        assert!(blocks[0].label.is_none());
    }

    #[test]
    fn depth_tracks_nesting_below_sections() {
        let blocks = render(&json!({
            "outer": { "inner": { "value": "1" } }
        }))
        .unwrap();
        // Section header and its immediate content share depth 0; deeper
        // nesting indents from there.
        assert_eq!(blocks[0].depth, 0);
        assert_eq!(blocks[1].depth, 0);
        assert_eq!(blocks[2].depth, 1);
    }

    #[test]
    fn pathological_depth_is_a_render_error() {
        let mut tree = json!("leaf");
        for _ in 0..80 {
            tree = json!({ "nested": tree });
        }
        assert!(matches!(render(&tree).unwrap_err(), Error::Render(_)));
    }

    #[test]
    fn whole_insight_record_flattens_in_order() {
        let blocks = render(&json!({
            "patient_summary": "56-year-old female, history of asthma.",
            "allergies": [],
            "test_results": {
                "blood_test": { "Uric Acid": "5.97" },
                "culture_test": []
            },
            "recommendations": ["Review asthma management plan."]
        }))
        .unwrap();

        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Leaf,   // patient_summary
                BlockKind::Header, // test_results (allergies skipped)
                BlockKind::Header, // blood_test
                BlockKind::Leaf,   // Uric Acid
                BlockKind::Header, // recommendations
                BlockKind::Bullet, // bullet item
            ]
        );
        let uric = blocks.iter().find(|b| b.text == "5.97").unwrap();
        assert!(uric.numeric);
    }
}
