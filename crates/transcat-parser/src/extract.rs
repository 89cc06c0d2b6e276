//! Extract translation-function occurrences from PHP syntax trees.

use crate::blade::{BladeCompiler, TemplateCompiler};
use crate::file_kind::FileKind;
use crate::treesitter;
use std::path::{Path, PathBuf};
use transcat_core::source::{FunctionTable, Occurrence};
use tree_sitter::Node;

/// Per-file extraction failures. None of these abort a scan.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error in {path} on line {line}, column {column}")]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("failed to load the PHP grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser produced no tree for {0}")]
    NoTree(PathBuf),
}

/// Finds literal arguments of configured translation functions.
pub struct SourceExtractor {
    functions: FunctionTable,
    compiler: Box<dyn TemplateCompiler>,
}

impl SourceExtractor {
    /// Extractor using the built-in Blade compiler.
    pub fn new(functions: FunctionTable) -> Self {
        Self {
            functions,
            compiler: Box::new(BladeCompiler::new()),
        }
    }

    /// Replace the template compiler used for Blade files.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl TemplateCompiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Extract occurrences from one file. Files of unknown kind yield nothing.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<Occurrence>, ExtractError> {
        let Some(kind) = FileKind::from_path(path) else {
            return Ok(Vec::new());
        };
        let bytes = std::fs::read(path).map_err(|source| ExtractError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = String::from_utf8_lossy(&bytes).into_owned();
        self.extract_source(path, kind, contents)
    }

    /// Extract from one file, logging and swallowing any per-file error.
    pub fn extract_or_skip(&self, path: &Path) -> Vec<Occurrence> {
        match self.extract_file(path) {
            Ok(found) => {
                tracing::debug!(file = %path.display(), count = found.len(), "extracted");
                found
            }
            Err(e) => {
                tracing::warn!("{e}");
                Vec::new()
            }
        }
    }

    /// Extract from in-memory contents of the given kind. `path` is used for diagnostics.
    pub fn extract_source(
        &self,
        path: &Path,
        kind: FileKind,
        contents: String,
    ) -> Result<Vec<Occurrence>, ExtractError> {
        if self.functions.is_empty() {
            return Ok(Vec::new());
        }
        let code = kind.to_code(contents, self.compiler.as_ref());
        let tree =
            treesitter::parse_php(&code)?.ok_or_else(|| ExtractError::NoTree(path.to_path_buf()))?;
        let root = tree.root_node();
        if let Some(err) = treesitter::first_error(root) {
            let pos = err.start_position();
            return Err(ExtractError::Syntax {
                path: path.to_path_buf(),
                line: pos.row + 1,
                column: pos.column + 1,
            });
        }

        let mut found = Vec::new();
        self.collect_calls(&root, &code, &mut found);
        Ok(found)
    }

    /// Recursively collect translation calls, outer calls before nested ones.
    fn collect_calls(&self, node: &Node<'_>, source: &str, found: &mut Vec<Occurrence>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "function_call_expression"
                && let Some(occurrence) = self.match_call(&child, source)
            {
                found.push(occurrence);
            }
            self.collect_calls(&child, source, found);
        }
    }

    fn match_call(&self, call: &Node<'_>, source: &str) -> Option<Occurrence> {
        let callee = call.child_by_field_name("function")?;
        let name = callee_name(&callee, source)?;
        let function = self.functions.get(&name)?;
        let args = call.child_by_field_name("arguments")?;
        let value_node = nth_argument(&args, function.argument)?;
        let value = literal_string(&value_node, source)?;
        Some(Occurrence {
            function: name,
            value,
        })
    }
}

/// Plain name of a statically resolvable callee. Variables and other
/// computed callees return `None`.
fn callee_name(node: &Node<'_>, source: &str) -> Option<String> {
    let text = &source[node.byte_range()];
    match node.kind() {
        "name" => Some(text.to_string()),
        "qualified_name" => Some(
            text.trim_start_matches('\\')
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        ),
        _ => None,
    }
}

/// Value expression of the positional argument at `index`.
fn nth_argument<'t>(args: &Node<'t>, index: usize) -> Option<Node<'t>> {
    let mut cursor = args.walk();
    let arg = args
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .nth(index)?;
    if arg.kind() != "argument" {
        return Some(arg);
    }
    // The value is the last non-comment child; a named argument's label precedes it.
    let mut cursor = arg.walk();
    arg.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .last()
}

const LITERAL_PARTS: &[&str] = &["string_content", "string_value", "escape_sequence"];

const HEREDOC_PARTS: &[&str] = &[
    "heredoc_start",
    "heredoc_end",
    "heredoc_body",
    "nowdoc_body",
    "nowdoc_string",
    "string_content",
    "string_value",
    "escape_sequence",
];

/// Decoded value of a literal string node. Interpolated strings, concatenations
/// and every other expression kind return `None`.
fn literal_string(node: &Node<'_>, source: &str) -> Option<String> {
    let text = &source[node.byte_range()];
    match node.kind() {
        "string" => {
            let inner = strip_quotes(text, '\'')?;
            Some(decode_single_quoted(inner))
        }
        "encapsed_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|c| !LITERAL_PARTS.contains(&c.kind()));
            if interpolated {
                return None;
            }
            let inner = strip_quotes(text, '"')?;
            Some(decode_double_quoted(inner, false))
        }
        "nowdoc" => heredoc_body(text),
        "heredoc" => {
            if has_foreign_descendant(node, HEREDOC_PARTS) {
                return None;
            }
            heredoc_body(text).map(|body| decode_double_quoted(&body, true))
        }
        _ => None,
    }
}

fn has_foreign_descendant(node: &Node<'_>, allowed: &[&str]) -> bool {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .any(|c| !allowed.contains(&c.kind()) || has_foreign_descendant(&c, allowed))
}

/// Text between the quotes, allowing PHP's binary-string `b` prefix.
fn strip_quotes(text: &str, quote: char) -> Option<&str> {
    let text = text
        .strip_prefix('b')
        .or_else(|| text.strip_prefix('B'))
        .unwrap_or(text);
    text.strip_prefix(quote)?.strip_suffix(quote)
}

/// Single-quoted strings only unescape `\\` and `\'`.
fn decode_single_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == '\\' || next == '\'')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Double-quoted and heredoc escapes. Heredocs keep `\"` verbatim.
fn decode_double_quoted(inner: &str, heredoc: bool) -> String {
    let bytes = inner.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        let simple = match next {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'v' => Some(0x0b),
            b'e' => Some(0x1b),
            b'f' => Some(0x0c),
            b'\\' => Some(b'\\'),
            b'$' => Some(b'$'),
            b'"' if !heredoc => Some(b'"'),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            i += 2;
            continue;
        }
        match next {
            b'0'..=b'7' => {
                let digits = count_while(&bytes[i + 1..], 3, |b| (b'0'..=b'7').contains(&b));
                let value = parse_radix(&bytes[i + 1..i + 1 + digits], 8);
                out.push((value & 0xff) as u8);
                i += 1 + digits;
            }
            b'x' if bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit) => {
                let digits = count_while(&bytes[i + 2..], 2, |b| b.is_ascii_hexdigit());
                let value = parse_radix(&bytes[i + 2..i + 2 + digits], 16);
                out.push((value & 0xff) as u8);
                i += 2 + digits;
            }
            b'u' if bytes.get(i + 2) == Some(&b'{') => {
                let close = bytes[i + 3..].iter().position(|&b| b == b'}');
                let decoded = close.and_then(|len| {
                    let digits = &bytes[i + 3..i + 3 + len];
                    let valid = !digits.is_empty() && digits.iter().all(u8::is_ascii_hexdigit);
                    valid
                        .then(|| char::from_u32(parse_radix(digits, 16)))
                        .flatten()
                        .map(|c| (c, len))
                });
                match decoded {
                    Some((c, len)) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        i += 3 + len + 1;
                    }
                    None => {
                        out.push(b'\\');
                        i += 1;
                    }
                }
            }
            _ => {
                out.push(b'\\');
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn count_while(bytes: &[u8], max: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take(max).take_while(|&&b| pred(b)).count()
}

fn parse_radix(digits: &[u8], radix: u32) -> u32 {
    digits.iter().fold(0u32, |acc, &b| {
        let d = char::from(b).to_digit(radix).unwrap_or(0);
        acc.saturating_mul(radix).saturating_add(d)
    })
}

/// Body of a heredoc/nowdoc with the closing marker's indentation removed
/// from every line, as PHP 7.3+ does.
fn heredoc_body(raw: &str) -> Option<String> {
    let first_newline = raw.find('\n')?;
    let rest = &raw[first_newline + 1..];
    let Some(last_newline) = rest.rfind('\n') else {
        return Some(String::new());
    };
    let body = rest[..last_newline].strip_suffix('\r').unwrap_or(&rest[..last_newline]);
    let closing = &rest[last_newline + 1..];
    let indent = closing.len() - closing.trim_start_matches([' ', '\t']).len();

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| {
            let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
            &line[ws.min(indent)..]
        })
        .collect();
    Some(lines.join("\n"))
}
