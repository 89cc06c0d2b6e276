use std::io::Write;
use std::path::Path;

use transcat_core::source::{FunctionTable, Occurrence};
use transcat_parser::{FileKind, SourceExtractor, TemplateCompiler};

fn extract_blade(template: &str) -> Vec<String> {
    SourceExtractor::new(FunctionTable::default())
        .extract_source(Path::new("view.blade.php"), FileKind::Blade, template.to_string())
        .unwrap()
        .into_iter()
        .map(|o| o.value)
        .collect()
}

#[test]
fn blade_echo_tags() {
    let found = extract_blade(
        r"<h1>{{ __('Welcome') }}</h1>
<p>{!! trans('home.intro') !!}</p>
",
    );
    assert_eq!(found, vec!["Welcome", "home.intro"]);
}

#[test]
fn blade_directives_and_php_blocks() {
    let found = extract_blade(
        r"@if($user)
    {{ __('Hello') }}
@else
    {{ __('Guest') }}
@endif
@php
    $title = trans('page.title');
@endphp
@section('title', __('Dashboard'))
",
    );
    assert_eq!(found, vec!["Hello", "Guest", "page.title", "Dashboard"]);
}

#[test]
fn blade_inline_css_at_rules_are_text() {
    let found = extract_blade(
        r"@extends('layouts.app')
<style>
@media (max-width: 600px) { .a { color: red; } }
@supports (display: grid) { .b { display: grid; } }
</style>
<h1>{{ __('Hello') }}</h1>
@datetime($post->created_at)
",
    );
    assert_eq!(found, vec!["Hello"]);
}

#[test]
fn blade_comments_are_ignored() {
    let found = extract_blade("{{-- {{ __('Hidden') }} --}}{{ __('Shown') }}");
    assert_eq!(found, vec!["Shown"]);
}

#[test]
fn blade_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("welcome.blade.php");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "@foreach($items as $i) {{{{ __('Item') }}}} @endforeach").unwrap();

    let found = SourceExtractor::new(FunctionTable::default())
        .extract_file(&path)
        .unwrap();
    assert_eq!(
        found,
        vec![Occurrence {
            function: "__".into(),
            value: "Item".into()
        }]
    );
}

struct Passthrough;

impl TemplateCompiler for Passthrough {
    fn compile(&self, template: &str) -> String {
        format!("<?php {template}")
    }
}

#[test]
fn blade_custom_compiler() {
    let found = SourceExtractor::new(FunctionTable::default())
        .with_compiler(Passthrough)
        .extract_source(Path::new("v.blade.php"), FileKind::Blade, "__('Raw');".into())
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, "Raw");
}

#[test]
fn unknown_extension_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "<?php __('Nope');").unwrap();
    let found = SourceExtractor::new(FunctionTable::default())
        .extract_file(&path)
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn unreadable_file_is_skipped() {
    let extractor = SourceExtractor::new(FunctionTable::default());
    let found = extractor.extract_or_skip(Path::new("/no/such/dir/view.blade.php"));
    assert!(found.is_empty());
}
