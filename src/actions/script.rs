use anyhow::Context;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::{InputSource, OutputTarget};

/// Loads the user's script, calls `process(input_text, input_source,
/// output_target)` and writes `str(result)` to stdout as UTF-8. The input text
/// arrives on stdin.
pub const BOOTSTRAP: &str = r#"
import sys
path, source, target = sys.argv[1], sys.argv[2], sys.argv[3]
text = sys.stdin.buffer.read().decode("utf-8")
ns = {"__name__": "__quick_panel__", "input_text": text,
      "input_source": source, "output_target": target}
with open(path, encoding="utf-8") as f:
    code = compile(f.read(), path, "exec")
exec(code, ns)
fn = ns.get("process")
if not callable(fn):
    sys.stderr.write("no process function found in script\n")
    sys.exit(3)
result = fn(text, source, target)
out = "" if result is None else str(result)
sys.stdout.buffer.write(out.encode("utf-8"))
"#;

/// Exit code the bootstrap uses when the script defines no `process`.
const NO_PROCESS_EXIT: i32 = 3;

pub const DEFAULT_TEMPLATE: &str = r#"# Input/output action script
# process() receives:
# - input_text: the input text
# - input_source: clipboard / selection / manual / none
# - output_target: text / url / clipboard / file / window

def process(input_text, input_source, output_target):
    """Return the text to deliver to the output target."""
    if input_text:
        return f"Result: {input_text}"
    return "No input"
"#;

pub const TEXT_PROCESSING_EXAMPLE: &str = r#"def process(input_text, input_source, output_target):
    if not input_text:
        return "Please provide some text"

    result = []
    result.append(f"Original: {input_text}")
    result.append(f"Upper: {input_text.upper()}")
    result.append(f"Lower: {input_text.lower()}")
    result.append(f"Title: {input_text.title()}")
    result.append(f"Reversed: {input_text[::-1]}")
    result.append(f"Characters: {len(input_text)}")
    result.append(f"Words: {len(input_text.split())}")
    return "\n".join(result)
"#;

pub const SYSTEM_INFO_EXAMPLE: &str = r#"def process(input_text, input_source, output_target):
    import datetime
    import os
    import platform

    info = ["=== System info ==="]
    info.append(f"Time: {datetime.datetime.now():%Y-%m-%d %H:%M:%S}")
    info.append(f"OS: {platform.system()} {platform.release()}")
    info.append(f"Python: {platform.python_version()}")
    info.append(f"Machine: {platform.machine()}")
    info.append(f"Working dir: {os.getcwd()}")
    return "\n".join(info)
"#;

/// Templates offered by the script editor, as `(label, content)`.
pub const TEMPLATES: [(&str, &str); 3] = [
    ("Default", DEFAULT_TEMPLATE),
    ("Text processing", TEXT_PROCESSING_EXAMPLE),
    ("System info", SYSTEM_INFO_EXAMPLE),
];

#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub script_path: PathBuf,
    pub input_text: String,
    pub input_source: InputSource,
    pub output_target: OutputTarget,
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    pub python: String,
    pub timeout: Duration,
}

impl ScriptRunner {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &crate::settings::ScriptsConfig) -> Self {
        Self::new(cfg.python.clone(), Duration::from_secs(cfg.timeout_secs.max(1)))
    }

    /// The interpreter invocation for `req`, with piped stdio and no console
    /// window on Windows.
    pub fn command(&self, req: &ScriptRequest) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-c")
            .arg(BOOTSTRAP)
            .arg(&req.script_path)
            .arg(req.input_source.as_str())
            .arg(req.output_target.as_str())
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }
        cmd
    }

    /// Run the script and return what `process` returned.
    pub fn run(&self, req: &ScriptRequest) -> anyhow::Result<String> {
        if !req.script_path.is_file() {
            anyhow::bail!("script file not found: {}", req.script_path.display());
        }

        tracing::debug!(script = %req.script_path.display(), "running script");
        let mut child = self
            .command(req)
            .spawn()
            .with_context(|| format!("failed to start interpreter '{}'", self.python))?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        if let Some(mut stdin) = child.stdin.take() {
            // A script that never reads stdin may close it early.
            let _ = stdin.write_all(req.input_text.as_bytes());
        }

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!(
                    "script {} timed out after {}s",
                    req.script_path.display(),
                    self.timeout.as_secs()
                );
            }
            std::thread::sleep(Duration::from_millis(20));
        };

        let out = join_reader(stdout);
        let err = join_reader(stderr);

        if !status.success() {
            if status.code() == Some(NO_PROCESS_EXIT) && err.contains("no process function") {
                anyhow::bail!("no process() function in {}", req.script_path.display());
            }
            anyhow::bail!("script failed ({status}): {}", err.trim());
        }
        Ok(out)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut r: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = r.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
