use quick_panel::actions::{Action, ActionKind};
use quick_panel::hotkey::{
    function_key_from_vk, parse_hotkey, ChordMatcher, HotkeyBindings, HotkeyManager,
    HotkeyTarget, Key,
};
use quick_panel::settings::Config;

#[test]
fn parse_simple_f_key() {
    let hk = parse_hotkey("F2").expect("should parse F2");
    assert_eq!(hk.key, Key::F(2));
    assert!(!hk.ctrl && !hk.shift && !hk.alt && !hk.win);
}

#[test]
fn parse_combo_hotkey() {
    let hk = parse_hotkey("Ctrl+Shift+Space").expect("should parse combination");
    assert_eq!(hk.key, Key::Space);
    assert!(hk.ctrl && hk.shift && !hk.alt);
    assert_eq!(hk.to_string(), "ctrl+shift+space");
}

#[test]
fn parse_invalid_hotkey() {
    assert!(parse_hotkey("Ctrl+Foo").is_none());
    assert!(parse_hotkey("Ctrl+Shift").is_none());
    assert!(parse_hotkey("ctrl+a+b").is_none());
    assert!(parse_hotkey("f25").is_none());
}

#[test]
fn display_is_canonical() {
    let hk = parse_hotkey("alt + CTRL + q").unwrap();
    assert_eq!(hk.to_string(), "ctrl+alt+q");
    assert_eq!(parse_hotkey(&hk.to_string()), Some(hk));
    assert_eq!(parse_hotkey("win+f12").unwrap().to_string(), "win+f12");
}

fn config_with_hotkeys() -> (Config, String) {
    let mut cfg = Config::default();
    let mut a = Action::new("a", ActionKind::Text { text: "a".into() });
    a.hotkey = "ctrl+1".into();
    let id = a.id.clone();
    let mut dup = Action::new("dup", ActionKind::Text { text: "b".into() });
    dup.hotkey = "Ctrl+1".into();
    let mut bad = Action::new("bad", ActionKind::Text { text: "c".into() });
    bad.hotkey = "ctrl+what".into();
    cfg.actions = vec![
        a,
        Action::new("p", ActionKind::Panel { actions: vec![dup, bad] }),
    ];
    (cfg, id)
}

#[test]
fn bindings_first_registration_wins() {
    let (cfg, id) = config_with_hotkeys();
    let bindings = HotkeyBindings::from_config(&cfg);
    assert_eq!(bindings.len(), 2);
    assert_eq!(
        bindings.target_of(&parse_hotkey("ctrl+1").unwrap()),
        Some(&HotkeyTarget::Action(id))
    );
    assert_eq!(
        bindings.target_of(&parse_hotkey("ctrl+alt+q").unwrap()),
        Some(&HotkeyTarget::TogglePanel)
    );
}

#[test]
fn matcher_is_edge_triggered() {
    let (cfg, id) = config_with_hotkeys();
    let mut m = ChordMatcher::new(HotkeyBindings::from_config(&cfg));
    assert_eq!(m.press(Key::Ctrl), None);
    assert_eq!(m.press(Key::Char('1')), Some(HotkeyTarget::Action(id.clone())));
    // auto-repeat
    assert_eq!(m.press(Key::Char('1')), None);
    m.release(Key::Char('1'));
    assert_eq!(m.press(Key::Char('1')), Some(HotkeyTarget::Action(id)));
    m.release(Key::Char('1'));
    m.release(Key::Ctrl);
    assert_eq!(m.press(Key::Char('1')), None);
}

#[test]
fn matcher_needs_exact_modifiers() {
    let mut m = ChordMatcher::new(HotkeyBindings::from_config(&Config::default()));
    m.press(Key::Ctrl);
    m.press(Key::Alt);
    m.press(Key::Shift);
    assert_eq!(m.press(Key::Char('Q')), None);
    m.release(Key::Char('Q'));
    m.release(Key::Shift);
    assert_eq!(m.press(Key::Char('Q')), Some(HotkeyTarget::TogglePanel));
}

#[test]
fn manager_delivers_events() {
    let manager = HotkeyManager::new(HotkeyBindings::default());
    assert!(manager.take_events().is_empty());
    let tx = manager.sender();
    tx.send(HotkeyTarget::TogglePanel).unwrap();
    tx.send(HotkeyTarget::Action("x".into())).unwrap();
    assert_eq!(
        manager.take_events(),
        vec![HotkeyTarget::TogglePanel, HotkeyTarget::Action("x".into())]
    );
    assert!(!manager.is_listening());
}

#[test]
fn high_function_keys_come_from_raw_codes() {
    assert_eq!(function_key_from_vk(0x7C), Some(Key::F(13)));
    assert_eq!(function_key_from_vk(0x87), Some(Key::F(24)));
    assert_eq!(function_key_from_vk(0x7B), None);
    assert_eq!(function_key_from_vk(0x88), None);
}

#[test]
fn ctrl_f13_binding_fires() {
    let mut cfg = Config::default();
    let mut a = Action::new("macro key", ActionKind::Text { text: "m".into() });
    a.hotkey = "ctrl+f13".into();
    let id = a.id.clone();
    cfg.actions = vec![a];
    assert!(parse_hotkey("ctrl+f13").is_some());

    let mut m = ChordMatcher::new(HotkeyBindings::from_config(&cfg));
    m.press(Key::Ctrl);
    let f13 = function_key_from_vk(0x7C).unwrap();
    assert_eq!(m.press(f13), Some(HotkeyTarget::Action(id)));
}
