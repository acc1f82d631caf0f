use anyhow::Context;
use std::path::Path;
use std::process::Command;

/// Launch a program action.
///
/// With explicit `args` the command is spawned directly. Without them an
/// existing file or folder is handed to the shell's default handler and any
/// other command line is run through the system shell.
pub fn launch_program(command: &str, args: &[String]) -> anyhow::Result<()> {
    let command = command.trim();
    if command.is_empty() {
        anyhow::bail!("empty program command");
    }

    if !args.is_empty() {
        Command::new(command)
            .args(args)
            .spawn()
            .with_context(|| format!("failed to start '{command}'"))?;
        return Ok(());
    }

    if Path::new(command).exists() {
        return open::that(command).with_context(|| format!("failed to open '{command}'"));
    }

    build_shell_command(command)
        .spawn()
        .with_context(|| format!("failed to run '{command}'"))?;
    Ok(())
}

/// The shell invocation used for bare command lines.
pub fn build_shell_command(line: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Split a free-form argument string the way a shell would, falling back to
/// whitespace splitting for unbalanced quotes.
pub fn split_args(arg_str: &str) -> Vec<String> {
    let arg_str = arg_str.trim();
    if arg_str.is_empty() {
        return Vec::new();
    }
    shlex::split(arg_str)
        .unwrap_or_else(|| arg_str.split_whitespace().map(str::to_string).collect())
}

pub fn open_url(url: &str) -> anyhow::Result<()> {
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("empty URL");
    }
    open::that(url).with_context(|| format!("failed to open {url}"))
}
