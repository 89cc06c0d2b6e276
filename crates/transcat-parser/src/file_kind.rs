//! File type detection by longest matching dot-suffix.

use crate::blade::TemplateCompiler;
use std::path::Path;

/// Turns raw file contents into PHP code ready for parsing.
pub type CodeHandler = fn(String, &dyn TemplateCompiler) -> String;

/// Kinds of source files the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `*.blade.php` templates, compiled to PHP before parsing.
    Blade,
    /// Plain `*.php` files.
    Php,
}

/// Registered suffixes. Lookup walks a file name's dot-tails from longest to
/// shortest, so `.blade.php` wins over `.php` regardless of table order.
const SUFFIXES: &[(&str, FileKind)] = &[(".blade.php", FileKind::Blade), (".php", FileKind::Php)];

impl FileKind {
    /// Resolve a file name such as `welcome.blade.php` to its kind.
    pub fn from_file_name(name: &str) -> Option<Self> {
        // "a.b.c" -> try ".b.c", then ".c"; the part before the first dot is the stem.
        let mut tail = name;
        while let Some(pos) = tail.find('.') {
            let candidate = &tail[pos..];
            if let Some(&(_, kind)) = SUFFIXES.iter().find(|(s, _)| *s == candidate) {
                return Some(kind);
            }
            tail = &candidate[1..];
        }
        None
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
    }

    pub fn name(self) -> &'static str {
        match self {
            FileKind::Blade => "blade",
            FileKind::Php => "php",
        }
    }

    /// The function that prepares this kind's contents for the PHP parser.
    pub fn handler(self) -> CodeHandler {
        match self {
            FileKind::Blade => compile_template,
            FileKind::Php => plain_code,
        }
    }

    /// Run this kind's handler over raw file contents.
    pub fn to_code(self, contents: String, compiler: &dyn TemplateCompiler) -> String {
        (self.handler())(contents, compiler)
    }
}

fn compile_template(contents: String, compiler: &dyn TemplateCompiler) -> String {
    compiler.compile(&contents)
}

fn plain_code(contents: String, _compiler: &dyn TemplateCompiler) -> String {
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blade::BladeCompiler;
    use std::path::PathBuf;

    #[test]
    fn test_blade_suffix_wins() {
        assert_eq!(
            FileKind::from_file_name("welcome.blade.php"),
            Some(FileKind::Blade)
        );
        assert_eq!(
            FileKind::from_path(&PathBuf::from("resources/views/x.blade.php")),
            Some(FileKind::Blade)
        );
    }

    #[test]
    fn test_plain_php() {
        assert_eq!(FileKind::from_file_name("User.php"), Some(FileKind::Php));
        assert_eq!(FileKind::from_file_name("app.config.php"), Some(FileKind::Php));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(FileKind::from_file_name("README.md"), None);
        assert_eq!(FileKind::from_file_name("php"), None);
        assert_eq!(FileKind::from_file_name("blade.phpx"), None);
    }

    #[test]
    fn test_handlers() {
        let compiler = BladeCompiler::new();
        let php = FileKind::Php.to_code("{{ $x }}".to_string(), &compiler);
        assert_eq!(php, "{{ $x }}");
        let blade = FileKind::Blade.to_code("{{ $x }}".to_string(), &compiler);
        assert_eq!(blade, "<?php echo e($x); ?>");
    }
}
