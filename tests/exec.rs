use quick_panel::actions::exec::{build_shell_command, launch_program, open_url, split_args};

#[test]
fn shell_command_wraps_line() {
    let cmd = build_shell_command("echo hi && echo there");
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    #[cfg(target_os = "windows")]
    {
        assert_eq!(cmd.get_program(), "cmd");
        assert_eq!(args, ["/C", "echo hi && echo there"]);
    }
    #[cfg(not(target_os = "windows"))]
    {
        assert_eq!(cmd.get_program(), "sh");
        assert_eq!(args, ["-c", "echo hi && echo there"]);
    }
}

#[test]
fn split_args_handles_quotes() {
    assert_eq!(split_args(r#"-n "two words" --flag"#), ["-n", "two words", "--flag"]);
    assert_eq!(split_args("  a   b "), ["a", "b"]);
    assert!(split_args("   ").is_empty());
}

#[test]
fn split_args_falls_back_on_unbalanced_quotes() {
    assert_eq!(split_args(r#"say "hello"#), ["say", "\"hello"]);
}

#[test]
fn empty_commands_are_errors() {
    assert!(launch_program("   ", &[]).is_err());
    assert!(open_url("").is_err());
}

#[test]
fn missing_program_with_args_fails_to_spawn() {
    let err = launch_program("definitely-not-a-real-program-xyz", &["a".into()]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to start"));
}
