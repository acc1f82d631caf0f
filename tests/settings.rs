use eframe::egui::Color32;
use quick_panel::hotkey::Key;
use quick_panel::settings::{parse_border, parse_color, Config};

#[test]
fn defaults_match_shipped_config() {
    let cfg = Config::default();
    assert_eq!(cfg.floating_button.size, 60);
    assert_eq!(cfg.action_panel.columns, 4);
    assert_eq!(cfg.action_panel.autosave_delay_ms, 1500);
    assert_eq!(cfg.backups.max_size_mb, 20);
    assert_eq!(cfg.hotkeys.toggle_panel, "ctrl+alt+q");
    assert!(cfg.actions.is_empty());
}

#[test]
fn partial_file_is_merged_over_defaults() {
    let cfg = Config::from_json(r#"{ "action_panel": { "columns": 6 } }"#).unwrap();
    assert_eq!(cfg.action_panel.columns, 6);
    assert_eq!(cfg.action_panel.width, 380.0);
    assert_eq!(cfg.floating_button.size, 60);
}

#[test]
fn empty_file_gives_defaults() {
    assert_eq!(Config::from_json("  \n").unwrap(), Config::default());
}

#[test]
fn unknown_keys_survive_a_round_trip() {
    let cfg = Config::from_json(r#"{ "theme": "dark" }"#).unwrap();
    let json = cfg.to_pretty_json().unwrap();
    assert!(json.contains("\"theme\": \"dark\""));
}

#[test]
fn invalid_toggle_hotkey_falls_back() {
    let cfg = Config::from_json(r#"{ "hotkeys": { "toggle_panel": "ctrl+nope" } }"#).unwrap();
    let hk = cfg.toggle_hotkey();
    assert_eq!(hk.key, Key::Char('Q'));
    assert!(hk.ctrl && hk.alt && !hk.shift);
}

#[test]
fn parses_config_colours() {
    assert_eq!(parse_color("#fff"), Some(Color32::from_rgb(255, 255, 255)));
    assert_eq!(parse_color("#4f7cff"), Some(Color32::from_rgb(79, 124, 255)));
    assert_eq!(
        parse_color("qlineargradient(x1:0, y1:0, x2:1, y2:1, stop:0 #4f7cff, stop:1 #6ce0ff)"),
        Some(Color32::from_rgb(79, 124, 255))
    );
    assert_eq!(
        parse_color("rgba(10, 20, 30, 1.0)"),
        Some(Color32::from_rgba_unmultiplied(10, 20, 30, 255))
    );
    assert_eq!(parse_color("white"), Some(Color32::WHITE));
    assert_eq!(parse_color("not a colour"), None);
}

#[test]
fn parses_css_border() {
    assert_eq!(
        parse_border("1px solid #ddd"),
        Some((1.0, Color32::from_rgb(221, 221, 221)))
    );
    assert_eq!(
        parse_border("solid #000"),
        Some((1.0, Color32::from_rgb(0, 0, 0)))
    );
    assert_eq!(parse_border("2px solid"), None);
}
