use quick_panel::quick_send::{unique_filename, QuickSendStore, Selection, DEFAULT_CAPTION};
use tempfile::tempdir;

fn empty_store(dir: &std::path::Path) -> QuickSendStore {
    // a placeholder file stops the samples from being created
    std::fs::write(dir.join("main.json"), "[]").unwrap();
    QuickSendStore::open(dir).unwrap()
}

#[test]
fn seeds_samples_into_empty_dir() {
    let dir = tempdir().unwrap();
    let store = QuickSendStore::open(dir.path()).unwrap();
    assert_eq!(store.files(), ["contacts", "replies"]);
    assert!(!store.items(&Selection::All).is_empty());
}

#[test]
fn all_concatenates_in_file_order() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("b.json"), r#"[{"key":"b1","text":"B1"}]"#).unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"[{"key":"a1","text":"A1"},{"key":"a2","text":"A2","tooltip":"second"}]"#,
    )
    .unwrap();
    let store = QuickSendStore::open(dir.path()).unwrap();
    let keys: Vec<&str> = store
        .items(&Selection::All)
        .iter()
        .map(|(_, i)| i.key.as_str())
        .collect();
    assert_eq!(keys, ["a1", "a2", "b1"]);

    let (r, _) = &store.items(&Selection::File("b".into()))[0];
    assert_eq!((r.file.as_str(), r.index), ("b", 0));
}

#[test]
fn filter_is_case_insensitive_on_all_fields() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"[{"key":"Hello","text":"greet"},{"key":"x","text":"y","tooltip":"Secret"}]"#,
    )
    .unwrap();
    let store = QuickSendStore::open(dir.path()).unwrap();
    assert_eq!(store.filter(&Selection::All, "hello").len(), 1);
    assert_eq!(store.filter(&Selection::All, "GREET").len(), 1);
    assert_eq!(store.filter(&Selection::All, "secret").len(), 1);
    assert_eq!(store.filter(&Selection::All, "").len(), 2);
    assert!(store.filter(&Selection::All, "zzz").is_empty());
}

#[test]
fn add_item_target_resolution() {
    let dir = tempdir().unwrap();
    let mut store = empty_store(dir.path());
    store.create_file("other").unwrap();

    // all selected: first file
    assert_eq!(store.add_item(None, &Selection::All, "one").unwrap(), "main");
    // explicit target wins over the selection
    assert_eq!(
        store
            .add_item(Some("other"), &Selection::File("main".into()), "two")
            .unwrap(),
        "other"
    );
    // unknown target falls back to the selection
    assert_eq!(
        store
            .add_item(Some("ghost"), &Selection::File("other".into()), "three")
            .unwrap(),
        "other"
    );
    assert!(store.add_item(None, &Selection::All, "   ").is_err());

    let items = store.items(&Selection::File("other".into()));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].1.text, DEFAULT_CAPTION);

    // saved to disk
    let reopened = QuickSendStore::open(dir.path()).unwrap();
    assert_eq!(reopened.items(&Selection::All).len(), 3);
}

#[test]
fn edit_delete_move() {
    let dir = tempdir().unwrap();
    let mut store = empty_store(dir.path());
    for c in ["a", "b", "c"] {
        store.add_item(Some("main"), &Selection::All, c).unwrap();
    }
    store.edit_item("main", 0, "First", "tip").unwrap();
    store.edit_item("main", 0, "First", "  ").unwrap();
    assert!(store.edit_item("main", 0, " ", "").is_err());
    let first = store.items(&Selection::All)[0].1.clone();
    assert_eq!(first.text, "First");
    assert_eq!(first.tooltip, None);

    assert!(store.move_item("main", 0, 2).unwrap());
    assert!(!store.move_item("main", 1, 1).unwrap());
    let keys: Vec<String> = store
        .items(&Selection::All)
        .iter()
        .map(|(_, i)| i.key.clone())
        .collect();
    assert_eq!(keys, ["b", "c", "a"]);

    assert_eq!(store.delete_item("main", 1).unwrap().key, "c");
    assert!(store.delete_item("main", 9).is_err());
    assert_eq!(store.save_all(), 1);
}

#[test]
fn create_file_rejects_duplicates() {
    let dir = tempdir().unwrap();
    let mut store = empty_store(dir.path());
    assert!(store.create_file("main").is_err());
    assert!(store.create_file("").is_err());
    store.create_file("new").unwrap();
    assert!(dir.path().join("new.json").exists());
    assert_eq!(store.files(), ["main", "new"]);
}

#[test]
fn unique_names() {
    let dir = tempdir().unwrap();
    assert_eq!(unique_filename(dir.path(), "My list!"), "My_list");
    assert_eq!(unique_filename(dir.path(), "联系人"), "联系人");
    assert!(unique_filename(dir.path(), "!!!").starts_with("quick_send_"));

    std::fs::write(dir.path().join("My_list.json"), "[]").unwrap();
    assert_eq!(unique_filename(dir.path(), "My list"), "My_list_1");
}

#[test]
fn create_for_action_makes_empty_file() {
    let dir = tempdir().unwrap();
    let mut store = empty_store(dir.path());
    let stem = store.create_for_action("main").unwrap();
    assert_eq!(stem, "main_1");
    assert!(store.has_file("main_1"));
    assert!(store.items(&Selection::File(stem)).is_empty());
}

#[test]
fn items_without_key_load_and_survive_save_all() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mine.json");
    std::fs::write(&path, r#"[{"text":"a"},{"key":"x","text":"y","color":"red"}]"#).unwrap();
    let store = QuickSendStore::open(dir.path()).unwrap();

    let items = store.items(&Selection::File("mine".into()));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].1.key, "");
    assert_eq!(items[1].1.extra.get("color"), Some(&serde_json::json!("red")));

    assert_eq!(store.save_all(), 1);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved.as_array().unwrap().len(), 2);
    assert_eq!(saved[0]["text"], "a");
    assert_eq!(saved[1]["color"], "red");
}

#[test]
fn unreadable_file_is_never_overwritten() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    let text = r#"[{"key": "half written""#;
    std::fs::write(&broken, text).unwrap();
    std::fs::write(dir.path().join("ok.json"), r#"[{"key":"k","text":"K"}]"#).unwrap();

    let mut store = QuickSendStore::open(dir.path()).unwrap();
    assert_eq!(store.files(), ["ok"]);
    assert_eq!(store.unreadable().collect::<Vec<_>>(), ["broken"]);
    assert!(!store.has_file("broken"));

    assert_eq!(store.save_all(), 1);
    assert!(store.save("broken").is_err());
    assert!(store.create_file("broken").is_err());
    assert_eq!(std::fs::read_to_string(&broken).unwrap(), text);

    // once fixed on disk a reload picks it up
    std::fs::write(&broken, r#"[{"key":"fixed","text":"F"}]"#).unwrap();
    store.reload();
    assert_eq!(store.files(), ["broken", "ok"]);
    assert_eq!(store.unreadable().count(), 0);
}

#[test]
fn edit_content_changes_what_is_sent() {
    let dir = tempdir().unwrap();
    let mut store = empty_store(dir.path());
    store
        .add_item(None, &Selection::File("main".into()), "old@example.com")
        .unwrap();

    store.edit_content("main", 0, "  new@example.com ").unwrap();
    assert!(store.edit_content("main", 0, "   ").is_err());
    assert!(store.edit_content("main", 5, "x").is_err());

    let reopened = QuickSendStore::open(dir.path()).unwrap();
    let items = reopened.items(&Selection::File("main".into()));
    assert_eq!(items[0].1.key, "new@example.com");
    assert_eq!(items[0].1.text, DEFAULT_CAPTION);
}
