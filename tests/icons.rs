use quick_panel::icons::{render_svg, IconManager};
use tempfile::tempdir;

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="8" viewBox="0 0 16 8"><rect width="16" height="8" fill="#ff0000"/></svg>"##;

#[test]
fn renders_and_caches_icons() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("red.svg"), SQUARE).unwrap();
    let mut icons = IconManager::new(dir.path());

    let icon = icons.get("red", 24).expect("icon should render");
    assert_eq!((icon.width, icon.height), (24, 24));
    assert_eq!(icon.rgba.len(), 24 * 24 * 4);
    // wide image is centred vertically: the top row stays transparent
    assert_eq!(icon.rgba[3], 0);
    let mid = (12 * 24 + 12) * 4;
    assert_eq!(&icon.rgba[mid..mid + 4], &[255, 0, 0, 255]);

    assert_eq!(icons.cache_len(), 1);
    icons.get("red", 24).unwrap();
    icons.get("red.svg", 24).unwrap();
    icons.get("red", 32).unwrap();
    assert_eq!(icons.cache_len(), 3);
    icons.clear_cache();
    assert_eq!(icons.cache_len(), 0);
}

#[test]
fn missing_or_broken_icons_give_none() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("broken.svg"), "not svg").unwrap();
    let mut icons = IconManager::new(dir.path());
    assert!(icons.get("nope", 24).is_none());
    assert!(icons.get("", 24).is_none());
    assert!(icons.get("broken", 24).is_none());
    assert_eq!(icons.cache_len(), 0);
    assert!(render_svg(&dir.path().join("broken.svg"), 0).is_err());
}

#[test]
fn resolves_names_and_paths() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("star.svg");
    std::fs::write(&file, SQUARE).unwrap();
    let other = tempdir().unwrap();
    let icons = IconManager::new(other.path());
    assert!(!icons.has_icon("star"));
    assert_eq!(icons.resolve(file.to_str().unwrap()), Some(file.clone()));

    let icons = IconManager::new(dir.path());
    assert_eq!(icons.resolve("star"), Some(file.clone()));
    assert_eq!(icons.resolve(" star.svg "), Some(file));
}

#[test]
fn lists_available_icons_sorted() {
    let dir = tempdir().unwrap();
    for name in ["zeta.svg", "alpha.svg", "notes.txt", "Mid.SVG"] {
        std::fs::write(dir.path().join(name), SQUARE).unwrap();
    }
    let icons = IconManager::new(dir.path());
    let names = icons.available_icons();
    assert!(names.contains(&"alpha".to_string()));
    assert!(names.contains(&"zeta".to_string()));
    assert!(!names.iter().any(|n| n.contains("notes")));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
