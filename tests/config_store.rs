use quick_panel::actions::{Action, ActionKind};
use quick_panel::config_store::{clean_filename, ConfigStore};
use quick_panel::paths::AppPaths;
use serde_json::json;
use tempfile::tempdir;

fn open_store(dir: &std::path::Path) -> ConfigStore {
    let paths = AppPaths::new(dir);
    paths.ensure_dirs().unwrap();
    ConfigStore::open(paths).unwrap()
}

#[test]
fn creates_default_file_when_missing() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    assert!(dir.path().join("config.json").exists());
    assert!(store.backup_files().is_empty());
}

#[test]
fn unchanged_config_is_not_rewritten() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    assert!(!store.save(false).unwrap());
    store.mark_modified();
    assert!(!store.save(false).unwrap());
}

#[test]
fn changed_config_is_saved_with_backup() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    store.config_mut().action_panel.columns = 5;
    assert!(store.save(false).unwrap());
    assert_eq!(store.backup_files().len(), 1);

    let reopened = open_store(dir.path());
    assert_eq!(reopened.config().action_panel.columns, 5);
}

#[test]
fn actions_persist() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let action = Action::new("Copy", ActionKind::Key { command: "ctrl+c".into() });
    let id = action.id.clone();
    store.actions_mut().push(action);
    store.save(false).unwrap();

    let reopened = open_store(dir.path());
    assert_eq!(reopened.actions().len(), 1);
    assert_eq!(reopened.actions()[0].id, id);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
    let store = open_store(dir.path());
    assert_eq!(store.config().action_panel.columns, 4);
}

#[test]
fn dotted_get_and_set() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    assert_eq!(store.get_value("action_panel.columns"), Some(json!(4)));
    store.set_value("action_panel.columns", json!(3)).unwrap();
    assert_eq!(store.config().action_panel.columns, 3);
    assert!(store.is_modified());
    assert!(store.set_value("action_panel.columns", json!("many")).is_err());
    assert_eq!(store.get_value("action_panel.missing"), None);
}

#[test]
fn backup_limit_rejects_zero() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    assert!(store.set_backup_limit(0).is_err());
    assert_eq!(store.set_backup_limit(5).unwrap(), 0);
    assert_eq!(store.backup_limit_mb(), 5);
    assert_eq!(store.config().backups.max_size_mb, 5);
}

#[test]
fn cleanup_removes_oldest_backups_over_limit() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let backups = dir.path().join("config_backups");
    let big = "x".repeat(600 * 1024);
    for i in 0..3 {
        std::fs::write(
            backups.join(format!("config_backup_20240101_00000{i}.json")),
            &big,
        )
        .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    // 1 MB holds one of the 600 KB files
    let removed = store.set_backup_limit(1).unwrap();
    assert_eq!(removed, 2);
    let left = store.backup_files();
    assert_eq!(left.len(), 1);
    assert!(left[0].ends_with("config_backup_20240101_000002.json"));
}

#[test]
fn load_backup_restores_and_keeps_current() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    store.config_mut().action_panel.columns = 7;
    store.save(false).unwrap();
    let name = store.backup_info().files[0].name.clone();

    store.load_backup(&name).unwrap();
    assert_eq!(store.config().action_panel.columns, 4);
    // the config with 7 columns was backed up before restoring
    let sevens = store
        .backup_files()
        .iter()
        .filter(|p| std::fs::read_to_string(p).unwrap().contains("\"columns\": 7"))
        .count();
    assert!(sevens >= 1);
    assert!(store.load_backup("config_backup_missing.json").is_err());
}

#[test]
fn load_backup_rejects_non_object() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let bad = "config_backup_20240101_000000.json";
    std::fs::write(dir.path().join("config_backups").join(bad), "[1, 2]").unwrap();
    assert!(store.load_backup(bad).is_err());
}

#[test]
fn load_backup_makes_one_backup_of_unsaved_state() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    store.config_mut().action_panel.columns = 7;
    store.save(false).unwrap();
    let name = store.backup_info().files[0].name.clone();
    let before = store.backup_files().len();

    // edited but not saved yet
    store.config_mut().action_panel.columns = 9;
    store.load_backup(&name).unwrap();

    let after = store.backup_files();
    assert_eq!(after.len(), before + 1);
    let nines = after
        .iter()
        .filter(|p| std::fs::read_to_string(p).unwrap().contains("\"columns\": 9"))
        .count();
    assert_eq!(nines, 1);
    assert_eq!(store.config().action_panel.columns, 4);
}

#[test]
fn load_backup_stays_inside_backup_dir() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    std::fs::write(dir.path().join("outside.json"), r#"{"debug_logging": true}"#).unwrap();

    assert!(store.load_backup("../outside.json").is_err());
    assert!(store.load_backup("..\\outside.json").is_err());
    assert!(store.load_backup("outside.json").is_err());
    assert!(!store.config().debug_logging);
    assert!(store.backup_files().is_empty());
}

#[test]
fn scripts_are_named_after_action() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let file = store
        .create_script("My Script!", "0123456789abcdef", "def process(t, s, o):\n    return t\n")
        .unwrap();
    assert_eq!(file, "My_Script!_01234567.py");
    assert!(store.read_script(&file).unwrap().contains("def process"));
    store.write_script(&file, "changed").unwrap();
    assert_eq!(store.read_script(&file).unwrap(), "changed");
    assert!(store.delete_script(&file).unwrap());
    assert!(!store.delete_script(&file).unwrap());
}

#[test]
fn clean_filename_rules() {
    assert_eq!(clean_filename("a  b"), "a_b");
    assert_eq!(clean_filename("a/b:c"), "a_b_c");
    assert_eq!(clean_filename("  "), "action");
    assert_eq!(clean_filename("abcdefghijklmnopqrstuvwxyz").len(), 15);
}

#[test]
fn lists_scripts_and_icons() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let file = store.create_script("Upper", "abcdef12-3456", "def process(t, s, o):\n    return t\n").unwrap();
    let scripts = dir.path().join("input_output_actions");
    std::fs::write(scripts.join("io_action_1.py"), "").unwrap();
    std::fs::write(scripts.join("helper.py"), "").unwrap();
    std::fs::write(scripts.join("notes_ABCDEFGH.py"), "").unwrap();
    assert_eq!(store.list_scripts(), vec!["Upper_abcdef12.py".to_string(), "io_action_1.py".to_string()]);
    assert_eq!(file, "Upper_abcdef12.py");

    std::fs::write(dir.path().join("svg").join("star.svg"), "<svg/>").unwrap();
    std::fs::write(dir.path().join("svg").join("readme.md"), "").unwrap();
    assert_eq!(store.svg_icons(), vec!["star".to_string()]);

    let action = store.create_action("Docs", ActionKind::Url { url: "https://example.com".into() });
    assert!(action.enabled);
    assert!(action.hotkey.is_empty() && action.icon_path.is_empty());
    assert_eq!(action.id.len(), 36);
    assert!(!action.created_at.is_empty());
}
