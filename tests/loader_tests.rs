// Integration tests for live reload through filesystem watches

mod common;

use arenamod::cache::ResourceCache;
use arenamod::config::{ConfigStore, LoadStatus, SchemaRegistry};
use arenamod::loader::FileWatchLoader;
use arenamod::models::{ComboState, ModGroup, TunnelMod};
use camino::Utf8Path;
use common::{WATCH_TIMEOUT, create_test_dir, replace_file, wait_until, write_json, write_png};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn create_test_loader<T: arenamod::config::Document>(base: &Utf8Path) -> FileWatchLoader<T> {
    let store = ConfigStore::new(Arc::new(SchemaRegistry::with_builtin()));
    let mut loader = FileWatchLoader::new(store);
    loader.set_base_path(base);
    loader
}

fn group_json(key: &str) -> String {
    format!(r#"{{"groupKey": "{key}", "activeModPath": "Mods/{key}"}}"#)
}

#[test]
fn test_edit_is_picked_up() {
    let (_temp_dir, root) = create_test_dir();
    write_json(&root, "ModGroup.json", &group_json("first"));
    let mut loader = create_test_loader::<ModGroup>(&root);

    loader.load_file().unwrap();
    assert_eq!(loader.take_changed().unwrap().group_key, "first");

    replace_file(&root, "ModGroup.json", &group_json("second"));

    assert!(wait_until(WATCH_TIMEOUT, || loader.is_dirty()));
    assert!(wait_until(WATCH_TIMEOUT, || {
        loader.latest().is_some_and(|g| g.group_key == "second")
    }));
    let changed = loader.take_changed().unwrap();
    assert_eq!(changed.group_key, "second");
    assert_eq!(changed.active_mod_path, "Mods/second");
}

#[test]
fn test_file_created_after_watch_started() {
    let (_temp_dir, root) = create_test_dir();
    let mut loader = create_test_loader::<ModGroup>(&root);

    loader.load_file().unwrap();
    assert_eq!(loader.last_status(), Some(LoadStatus::Missing));
    loader.take_changed();

    replace_file(&root, "ModGroup.json", &group_json("late"));

    assert!(wait_until(WATCH_TIMEOUT, || {
        loader.latest().is_some_and(|g| g.group_key == "late")
    }));
    assert_eq!(loader.last_status(), Some(LoadStatus::Loaded));
}

#[test]
fn test_burst_of_edits_yields_latest_value() {
    let (_temp_dir, root) = create_test_dir();
    write_json(&root, "ModGroup.json", &group_json("v0"));
    let mut loader = create_test_loader::<ModGroup>(&root);
    loader.load_file().unwrap();
    loader.take_changed();

    for i in 1..=5 {
        replace_file(&root, "ModGroup.json", &group_json(&format!("v{i}")));
    }

    assert!(wait_until(WATCH_TIMEOUT, || {
        loader.latest().is_some_and(|g| g.group_key == "v5")
    }));
    // However many reloads ran, the consumer sees the newest value
    assert_eq!(loader.take_changed().unwrap().group_key, "v5");
}

#[test]
fn test_other_files_in_folder_are_ignored() {
    let (_temp_dir, root) = create_test_dir();
    write_json(&root, "ModGroup.json", &group_json("stable"));
    let mut loader = create_test_loader::<ModGroup>(&root);
    loader.load_file().unwrap();
    loader.take_changed();

    replace_file(&root, "Mod.json", r#"{"name": "unrelated"}"#);
    std::thread::sleep(Duration::from_millis(500));

    assert!(!loader.is_dirty());
}

#[test]
fn test_disposed_loader_ignores_edits() {
    let (_temp_dir, root) = create_test_dir();
    write_json(&root, "ModGroup.json", &group_json("before"));
    let mut loader = create_test_loader::<ModGroup>(&root);
    loader.load_file().unwrap();
    loader.take_changed();

    loader.dispose_watcher();
    replace_file(&root, "ModGroup.json", &group_json("after"));
    std::thread::sleep(Duration::from_millis(500));

    assert!(!loader.is_dirty());
    assert_eq!(loader.latest().unwrap().group_key, "before");
}

#[test]
fn test_watch_reloads_are_counted_and_observed() {
    let (_temp_dir, root) = create_test_dir();
    write_json(&root, "ModGroup.json", &group_json("a"));
    let store = ConfigStore::new(Arc::new(SchemaRegistry::with_builtin()));
    let metrics = Arc::clone(store.metrics());
    let mut loader: FileWatchLoader<ModGroup> = FileWatchLoader::new(store);
    loader.set_base_path(&root);

    let observed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&observed);
    loader.set_on_loaded(move |group, status| {
        if *status == LoadStatus::Loaded && group.group_key == "b" {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    loader.load_file().unwrap();
    replace_file(&root, "ModGroup.json", &group_json("b"));

    assert!(wait_until(WATCH_TIMEOUT, || observed.load(Ordering::SeqCst) > 0));
    assert!(metrics.watch_reloads.load(Ordering::Relaxed) >= 1);
}

#[test]
fn test_tunnel_textures_resolve_against_mod_folder() {
    let (_temp_dir, root) = create_test_dir();
    let mod_folder = root.join("Mods/tunnel");
    write_png(&mod_folder.join("textures/stripes.png"), 8, 4);
    write_json(
        &mod_folder,
        "TunnelMod.json",
        r#"{
            "activateState": "comboX3",
            "useCache": true,
            "comboX3": {"layer1": {"texture": "textures/stripes.png", "alpha": 0.9}}
        }"#,
    );

    let mut loader = create_test_loader::<TunnelMod>(&mod_folder);
    loader.load_file().unwrap();
    let mut tunnel = (*loader.take_changed().unwrap()).clone();

    let cache = ResourceCache::new();
    tunnel.load_textures(&cache, &mod_folder);

    assert_eq!(tunnel.active_state(), Some(ComboState::ComboX3));
    let layer = &tunnel.state(ComboState::ComboX3).layer1;
    assert_eq!(layer.alpha, 0.9);
    let texture = layer.loaded_texture.as_ref().unwrap();
    assert!(!texture.is_placeholder());
    assert_eq!((texture.width, texture.height), (8, 4));
    assert!(tunnel.state(ComboState::Normal).layer1.loaded_texture.is_none());
    assert!(cache.contains(&mod_folder.join("textures/stripes.png")));
}
