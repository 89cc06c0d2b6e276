//! Tree-sitter integration for PHP parsing.

use tree_sitter::{Node, Tree};

/// The PHP grammar, including inline HTML around `<?php` tags.
pub fn php_language() -> tree_sitter::Language {
    tree_sitter_php::LANGUAGE_PHP.into()
}

/// Parse PHP source and return the tree-sitter tree.
///
/// Returns `Ok(None)` only if the parser gave up without producing a tree.
pub fn parse_php(source: &str) -> Result<Option<Tree>, tree_sitter::LanguageError> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&php_language())?;
    Ok(parser.parse(source.as_bytes(), None))
}

/// First ERROR or MISSING node in the tree, in source order.
pub fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    if root.is_error() || root.is_missing() {
        return Some(root);
    }
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_php() {
        let tree = parse_php("<?php echo __('Hi');").unwrap().unwrap();
        assert!(first_error(tree.root_node()).is_none());
    }

    #[test]
    fn test_reports_first_error() {
        let tree = parse_php("<?php\n$a = ;\n").unwrap().unwrap();
        let err = first_error(tree.root_node()).expect("syntax error expected");
        assert_eq!(err.start_position().row, 1);
    }
}
