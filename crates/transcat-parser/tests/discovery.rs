use std::fs;
use std::path::PathBuf;

use transcat_parser::{list_files, list_roots};

fn touch(root: &std::path::Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "<?php\n").unwrap();
}

#[test]
fn lists_php_and_blade_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "b/Second.php");
    touch(root, "a/view.blade.php");
    touch(root, "a/First.php");
    touch(root, "README.md");
    touch(root, "a/style.css");

    let files = list_files(root);
    let rel: Vec<PathBuf> = files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        rel,
        vec![
            PathBuf::from("a/First.php"),
            PathBuf::from("a/view.blade.php"),
            PathBuf::from("b/Second.php"),
        ]
    );
}

#[test]
fn skips_hidden_files_and_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, ".hidden/Secret.php");
    touch(root, "app/.env.php");
    touch(root, "app/Visible.php");

    let files = list_files(root);
    assert_eq!(files, vec![root.join("app/Visible.php")]);
}

#[test]
fn multiple_roots_keep_order_and_dedup() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(root, "routes/web.php");
    touch(root, "app/Model.php");

    let roots = vec![root.join("routes"), root.join("app"), root.join("missing"), root.join("routes")];
    let files = list_roots(&roots);
    assert_eq!(
        files,
        vec![root.join("routes/web.php"), root.join("app/Model.php")]
    );
}
