//! Namespace-agnostic helpers over a `roxmltree` document.
//!
//! ISO 19139 in the wild mixes gmd/gco/gmx/srv prefixes and revisions, so
//! lookups match on local element names only. Every helper returns `Option`;
//! absent structure is never an error here.

use roxmltree::Node;

pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Walk a path of nested element names, taking the first match at each step.
pub fn descend<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for name in path {
        current = child(current, name)?;
    }
    Some(current)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed text content of the node itself.
pub fn text(node: Node<'_, '_>) -> Option<String> {
    node.text().and_then(non_empty)
}

/// Text of a `gco:CharacterString` (or `gmx:Anchor`) child, the usual ISO
/// wrapper around string values. Falls back to the node's own text for
/// unwrapped values such as `gmd:MD_TopicCategoryCode`.
pub fn char_string(node: Node<'_, '_>) -> Option<String> {
    for wrapper in ["CharacterString", "Anchor"] {
        if let Some(inner) = child(node, wrapper) {
            return text(inner);
        }
    }
    text(node)
}

/// `char_string` of a named child.
pub fn char_string_of(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).and_then(char_string)
}

/// Value of a codelist element: `<gmd:role><gmd:CI_RoleCode
/// codeListValue="author">author</gmd:CI_RoleCode></gmd:role>`. The
/// attribute wins; element text is the fallback.
pub fn code_list_value(node: Node<'_, '_>, code_element: &str) -> Option<String> {
    let code = child(node, code_element)?;
    code.attribute("codeListValue")
        .and_then(non_empty)
        .or_else(|| text(code))
}

/// A `gco:Date` or `gco:DateTime` child.
pub fn date_value(node: Node<'_, '_>) -> Option<String> {
    for wrapper in ["Date", "DateTime"] {
        if let Some(inner) = child(node, wrapper) {
            return text(inner);
        }
    }
    None
}

/// Parse the text of a `gco:Decimal` (or similar) child as f64. Parse
/// failures and non-finite values yield `None`.
pub fn decimal(node: Node<'_, '_>) -> Option<f64> {
    let inner = node
        .children()
        .find(|n| n.is_element() && matches!(n.tag_name().name(), "Decimal" | "Real"))?;
    let value: f64 = text(inner)?.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse the text of a `gco:Integer` child as u64.
pub fn integer(node: Node<'_, '_>) -> Option<u64> {
    let inner = child(node, "Integer")?;
    text(inner)?.parse().ok()
}

/// Parse a `gco:Boolean` child.
pub fn boolean(node: Node<'_, '_>) -> Option<bool> {
    let inner = child(node, "Boolean")?;
    match text(inner)?.as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// URL of a `gmd:URL` child (used in `gmd:linkage`).
pub fn url_of(node: Node<'_, '_>, name: &str) -> Option<String> {
    let wrapper = child(node, name)?;
    child(wrapper, "URL").and_then(text).or_else(|| text(wrapper))
}
