//! Blade template compilation to plain PHP.
//!
//! Only the constructs that matter for locating function calls are compiled:
//! echo tags, comments, control-structure directives, `@php` blocks, and the
//! argument-carrying built-in directives. Anything else starting with `@`
//! (`@csrf`, `@endsection`, CSS at-rules such as `@media (...)`) stays as
//! template text.

/// Built-in directives whose arguments are PHP expressions.
const ARGUMENT_DIRECTIVES: &[&str] = &[
    "auth",
    "aware",
    "break",
    "can",
    "canany",
    "cannot",
    "case",
    "checked",
    "class",
    "component",
    "continue",
    "dd",
    "disabled",
    "dump",
    "each",
    "env",
    "error",
    "extends",
    "fragment",
    "guest",
    "hasSection",
    "include",
    "includeFirst",
    "includeIf",
    "includeUnless",
    "includeWhen",
    "inject",
    "js",
    "json",
    "method",
    "once",
    "prepend",
    "prependOnce",
    "props",
    "push",
    "pushIf",
    "pushOnce",
    "readonly",
    "required",
    "section",
    "sectionMissing",
    "selected",
    "session",
    "slot",
    "stack",
    "style",
    "switch",
    "use",
    "vite",
    "yield",
];

/// Compiles template source into PHP code the extractor can parse.
pub trait TemplateCompiler: Sync {
    fn compile(&self, template: &str) -> String;
}

/// Built-in Blade compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct BladeCompiler;

impl BladeCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateCompiler for BladeCompiler {
    fn compile(&self, template: &str) -> String {
        Compilation::new(template).run()
    }
}

struct Compilation<'a> {
    src: &'a str,
    pos: usize,
    out: String,
    /// Open `@forelse` loops awaiting their `@empty`.
    forelse: Vec<usize>,
    forelse_seq: usize,
}

impl<'a> Compilation<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            out: String::with_capacity(src.len() + src.len() / 4),
            forelse: Vec::new(),
            forelse_seq: 0,
        }
    }

    fn run(mut self) -> String {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with("<?php") || rest.starts_with("<?=") {
                self.copy_php_block();
            } else if rest.starts_with("{{--") {
                self.skip_comment();
            } else if rest.starts_with("@{{") {
                // Escaped echo: emit the braces literally.
                self.out.push_str("{{");
                self.pos += 3;
            } else if rest.starts_with("{!!") {
                self.echo("{!!", "!!}", false);
            } else if rest.starts_with("{{{") {
                self.echo("{{{", "}}}", true);
            } else if rest.starts_with("{{") {
                self.echo("{{", "}}", true);
            } else if rest.starts_with('@') && !self.preceded_by_word_char() {
                self.directive();
            } else {
                self.copy_char();
            }
        }
        self.out
    }

    fn copy_char(&mut self) {
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.out.push(c);
            self.pos += c.len_utf8();
        }
    }

    fn copy_rest(&mut self) {
        self.out.push_str(&self.src[self.pos..]);
        self.pos = self.src.len();
    }

    fn preceded_by_word_char(&self) -> bool {
        self.src[..self.pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    /// Raw PHP is passed through untouched up to and including `?>`.
    fn copy_php_block(&mut self) {
        match self.src[self.pos..].find("?>") {
            Some(off) => {
                let end = self.pos + off + 2;
                self.out.push_str(&self.src[self.pos..end]);
                self.pos = end;
            }
            None => self.copy_rest(),
        }
    }

    fn skip_comment(&mut self) {
        match self.src[self.pos + 4..].find("--}}") {
            Some(off) => self.pos += 4 + off + 4,
            None => self.copy_rest(),
        }
    }

    fn echo(&mut self, open: &str, close: &str, escaped: bool) {
        let start = self.pos + open.len();
        let Some(off) = self.src[start..].find(close) else {
            self.copy_rest();
            return;
        };
        let expr = self.src[start..start + off].trim();
        if escaped {
            self.out.push_str(&format!("<?php echo e({expr}); ?>"));
        } else {
            self.out.push_str(&format!("<?php echo {expr}; ?>"));
        }
        self.pos = start + off + close.len();
    }

    fn directive(&mut self) {
        let at = self.pos;
        let rest = &self.src[at + 1..];

        // `@@if` renders a literal `@if`.
        if rest.starts_with('@') {
            self.out.push('@');
            self.pos += 2;
            return;
        }

        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if name_len == 0 {
            self.copy_char();
            return;
        }
        let name = &rest[..name_len];
        let name_end = at + 1 + name_len;

        let after_ws = name_end
            + self.src[name_end..]
                .find(|c: char| c != ' ' && c != '\t')
                .unwrap_or(self.src.len() - name_end);
        let (args, end) = if self.src[after_ws..].starts_with('(') {
            match find_closing_paren(self.src, after_ws) {
                Some(close) => (Some(&self.src[after_ws + 1..close]), close + 1),
                None => (None, name_end),
            }
        } else {
            (None, name_end)
        };

        match name {
            "verbatim" => return self.block(name_end, "@endverbatim", false),
            "php" if args.is_none() => return self.block(name_end, "@endphp", true),
            _ => {}
        }

        let compiled = match (name, args) {
            ("php", Some(a)) => format!("<?php ({a}); ?>"),
            ("if", Some(a)) => format!("<?php if({a}): ?>"),
            ("elseif", Some(a)) => format!("<?php elseif({a}): ?>"),
            ("else", _) => "<?php else: ?>".to_string(),
            ("endif" | "endunless" | "endisset" | "endempty" | "endforelse", _) => {
                "<?php endif; ?>".to_string()
            }
            ("unless", Some(a)) => format!("<?php if (! ({a})): ?>"),
            ("isset", Some(a)) => format!("<?php if(isset({a})): ?>"),
            ("empty", Some(a)) => format!("<?php if(empty({a})): ?>"),
            ("empty", None) => match self.forelse.pop() {
                Some(n) => format!("<?php endforeach; if ($__empty_{n}): ?>"),
                None => format!("@{name}"),
            },
            ("for", Some(a)) => format!("<?php for({a}): ?>"),
            ("endfor", _) => "<?php endfor; ?>".to_string(),
            ("foreach", Some(a)) => format!("<?php foreach({a}): ?>"),
            ("endforeach", _) => "<?php endforeach; ?>".to_string(),
            ("forelse", Some(a)) => {
                self.forelse_seq += 1;
                let n = self.forelse_seq;
                self.forelse.push(n);
                format!("<?php $__empty_{n} = true; foreach({a}): $__empty_{n} = false; ?>")
            }
            ("while", Some(a)) => format!("<?php while({a}): ?>"),
            ("endwhile", _) => "<?php endwhile; ?>".to_string(),
            ("lang", Some(a)) => format!("<?php echo app('translator')->get({a}); ?>"),
            ("choice", Some(a)) => format!("<?php echo app('translator')->choice({a}); ?>"),
            (_, Some(a)) if ARGUMENT_DIRECTIVES.contains(&name) => {
                if a.trim().is_empty() {
                    format!("<?php $__env->directive('{name}'); ?>")
                } else {
                    format!("<?php $__env->directive('{name}', {a}); ?>")
                }
            }
            // Unknown names keep their arguments as text.
            _ => {
                self.out.push('@');
                self.out.push_str(name);
                self.pos = name_end;
                return;
            }
        };
        self.out.push_str(&compiled);
        self.pos = end;
    }

    /// `@verbatim`/`@php` bodies run to their closing directive.
    fn block(&mut self, body_start: usize, terminator: &str, as_php: bool) {
        let Some(off) = self.src[body_start..].find(terminator) else {
            self.copy_rest();
            return;
        };
        let body = &self.src[body_start..body_start + off];
        if as_php {
            self.out.push_str("<?php");
            self.out.push_str(body);
            self.out.push_str("?>");
        } else {
            self.out.push_str(body);
        }
        self.pos = body_start + off + terminator.len();
    }
}

/// Index of the `)` matching the `(` at `open`, skipping quoted strings.
fn find_closing_paren(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}
