use flexload_cache::{CacheConfig, FileStore, MemoryStore, UnavailableStore};
use flexload_indexer::{LoaderConfig, Registration, Resolution, Resolver};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, body).expect("write file");
}

/// `<tmp>/app/src/Models/User.src` declaring `Models.User`.
fn setup_app() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("tempdir");
    let src = temp.path().canonicalize().expect("canonical").join("app/src");
    write(
        &src.join("Models/User.src"),
        r#"<?php
namespace Models;

/**
 * class NotThisOne
 */
class User extends Base
{
    const KIND = "class Fake";
}
"#,
    );
    (temp, src)
}

fn file_config(cache_dir: &Path) -> LoaderConfig {
    LoaderConfig::default().with_cache(CacheConfig {
        dir: cache_dir.to_path_buf(),
        ..Default::default()
    })
}

#[test]
fn resolves_from_fresh_scan_and_from_cache_hit() {
    let (temp, src) = setup_app();
    let cache_dir = temp.path().join("cache");
    let user = src.join("Models/User.src");

    let mut first = Resolver::from_config(&file_config(&cache_dir)).expect("resolver");
    first.register_root(&src).expect("register");
    assert_eq!(
        first.resolve_name("Models.User").expect("resolve"),
        Resolution::Resolved(user.clone())
    );
    assert_eq!(first.index_cache().stats().misses, 1);
    assert_eq!(
        first.resolve_name("NotThisOne").expect("resolve"),
        Resolution::NotFound
    );
    assert_eq!(first.resolve_name("Fake").expect("resolve"), Resolution::NotFound);

    // a second process sees the persisted entry and never scans
    let mut second = Resolver::from_config(&file_config(&cache_dir)).expect("resolver");
    second.register_root(&src).expect("register");
    assert_eq!(second.index_cache().stats().hits, 1);
    assert_eq!(second.index_cache().stats().scans, 0);
    assert_eq!(
        second.resolve_name("Models\\User").expect("resolve"),
        Resolution::Resolved(user)
    );
}

#[test]
fn cached_entry_for_deleted_file_falls_through_to_rescan() {
    let (temp, src) = setup_app();
    let cache_dir = temp.path().join("cache");

    let mut warm = Resolver::from_config(&file_config(&cache_dir)).expect("resolver");
    warm.register_root(&src).expect("register");

    // moved while nobody was looking; the persisted entry is now stale
    let moved = src.join("Domain/User.src");
    write(&moved, "namespace Models; class User {}");
    fs::remove_file(src.join("Models/User.src")).expect("remove");

    let store = FileStore::new(&cache_dir);
    let mut cold = Resolver::new(&LoaderConfig::default(), Box::new(store)).expect("resolver");
    cold.register_root(&src).expect("register");
    assert_eq!(cold.index_cache().stats().hits, 1);
    assert_eq!(
        cold.registry().class_path("Models.User"),
        Some(src.join("Models/User.src").as_path())
    );

    assert_eq!(
        cold.resolve_name("Models.User").expect("resolve"),
        Resolution::Resolved(moved)
    );
    assert_eq!(cold.stats().rescans, 1);
}

#[test]
fn deleted_file_never_returns_dangling_path() {
    let (_temp, src) = setup_app();
    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");
    resolver.register_root(&src).expect("register");

    fs::remove_file(src.join("Models/User.src")).expect("remove");
    assert_eq!(
        resolver.resolve_name("Models.User").expect("resolve"),
        Resolution::NotFound
    );
    assert_eq!(
        resolver.resolve_name("Models.User").expect("resolve"),
        Resolution::NotFound
    );
    assert_eq!(resolver.stats().rescans, 1);
}

#[test]
fn rescan_bound_holds_across_many_prefixes() {
    let temp = TempDir::new().expect("tempdir");
    let base = temp.path().canonicalize().expect("canonical");
    let roots: Vec<PathBuf> = ["one", "two", "three"]
        .iter()
        .map(|name| base.join(name))
        .collect();
    write(&roots[0].join("A.src"), "namespace Acme; class A {}");
    write(&roots[1].join("B.src"), "namespace Acme.Billing; class B {}");
    write(&roots[2].join("C.src"), "namespace Acme.Billing.Tax; class C {}");

    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");
    for root in &roots {
        resolver.register_root(root).expect("register");
    }

    for _ in 0..3 {
        assert_eq!(
            resolver
                .resolve_name("Acme.Billing.Tax.Ghost")
                .expect("resolve"),
            Resolution::NotFound
        );
        assert_eq!(
            resolver.resolve_name("Acme.Billing.Ghost").expect("resolve"),
            Resolution::NotFound
        );
    }
    assert_eq!(resolver.stats().rescans, 3);
    assert_eq!(resolver.registry().rescanned_count(), 3);
}

#[test]
fn register_twice_changes_nothing() {
    let (_temp, src) = setup_app();
    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");

    assert!(matches!(
        resolver.register_root(&src).expect("register"),
        Registration::Indexed { symbols: 1, .. }
    ));
    let roots = resolver.registry().roots().len();
    let namespaces = resolver.registry().namespaces().clone();
    let search_path = resolver.registry().search_path().entries().to_vec();

    assert!(matches!(
        resolver.register_root(&src).expect("register"),
        Registration::AlreadyRegistered { .. }
    ));
    assert_eq!(resolver.registry().roots().len(), roots);
    assert_eq!(resolver.registry().namespaces(), &namespaces);
    assert_eq!(resolver.registry().search_path().entries(), search_path.as_slice());
}

#[test]
fn excluded_directories_never_enter_class_map() {
    let (_temp, src) = setup_app();
    write(
        &src.join("vendor/acme/Models/Admin.src"),
        "namespace Models; class Admin {}",
    );
    write(
        &src.join(".backup/Models/Admin.src"),
        "namespace Models; class Admin {}",
    );

    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");
    resolver.register_root(&src).expect("register");

    assert_eq!(
        resolver.resolve_name("Models.Admin").expect("resolve"),
        Resolution::NotFound
    );
    assert!(resolver
        .registry()
        .class_map()
        .values()
        .all(|path| !path.components().any(|c| c.as_os_str() == "vendor")));
}

#[test]
fn unavailable_cache_still_resolves() {
    let (_temp, src) = setup_app();
    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(UnavailableStore)).expect("resolver");
    resolver.register_root(&src).expect("register");

    assert_eq!(
        resolver.resolve_name("Models.User").expect("resolve"),
        Resolution::Resolved(src.join("Models/User.src"))
    );
    assert!(resolver.index_cache().stats().errors >= 2);
}

#[test]
fn malformed_sibling_does_not_block_resolution() {
    let (_temp, src) = setup_app();
    write(
        &src.join("Models/Broken.src"),
        "namespace Models; class Broken { /* unterminated",
    );

    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");
    resolver.register_root(&src).expect("register");

    assert!(resolver
        .resolve_name("Models.User")
        .expect("resolve")
        .is_resolved());
    assert_eq!(
        resolver.resolve_name("Models.Broken").expect("resolve"),
        Resolution::NotFound
    );
}

#[test]
fn large_generated_file_is_indexed_by_default() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path().canonicalize().expect("canonical");
    let mut body = String::from("<?php\nnamespace Gen;\nclass Big {}\n");
    while body.len() < 1_300_000 {
        body.push_str("// generated padding line for a large source file\n");
    }
    write(&root.join("Big.src"), &body);

    let mut resolver =
        Resolver::new(&LoaderConfig::default(), Box::new(MemoryStore::new(8))).expect("resolver");
    resolver.register_root(&root).expect("register");

    assert_eq!(
        resolver.resolve_name("Gen.Big").expect("resolve"),
        Resolution::Resolved(root.join("Big.src"))
    );
}
