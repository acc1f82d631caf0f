use std::path::Path;
use std::process::Command;
use std::time::Duration;

use quick_panel::actions::script::{ScriptRequest, ScriptRunner, DEFAULT_TEMPLATE};
use quick_panel::actions::{InputSource, OutputTarget};
use tempfile::tempdir;

fn python() -> Option<String> {
    ["python3", "python"]
        .into_iter()
        .find(|p| {
            Command::new(p)
                .arg("--version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
        .map(str::to_string)
}

fn request(path: &Path, input: &str) -> ScriptRequest {
    ScriptRequest {
        script_path: path.to_path_buf(),
        input_text: input.into(),
        input_source: InputSource::Clipboard,
        output_target: OutputTarget::Window,
    }
}

#[test]
fn runs_process_function() {
    let Some(py) = python() else {
        eprintln!("python not available, skipping");
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("echo.py");
    std::fs::write(
        &path,
        "def process(text, source, target):\n    return f\"{text.upper()}|{source}|{target}\"\n",
    )
    .unwrap();

    let runner = ScriptRunner::new(py, Duration::from_secs(10));
    let out = runner.run(&request(&path, "héllo wörld")).unwrap();
    assert_eq!(out, "HÉLLO WÖRLD|clipboard|window");
}

#[test]
fn default_template_runs() {
    let Some(py) = python() else {
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("template.py");
    std::fs::write(&path, DEFAULT_TEMPLATE).unwrap();
    let runner = ScriptRunner::new(py, Duration::from_secs(10));
    assert_eq!(runner.run(&request(&path, "x")).unwrap(), "Result: x");
    assert_eq!(runner.run(&request(&path, "")).unwrap(), "No input");
}

#[test]
fn missing_process_is_an_error() {
    let Some(py) = python() else {
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.py");
    std::fs::write(&path, "x = 1\n").unwrap();
    let runner = ScriptRunner::new(py, Duration::from_secs(10));
    let err = runner.run(&request(&path, "")).unwrap_err();
    assert!(err.to_string().contains("no process() function"));
}

#[test]
fn script_exception_is_an_error() {
    let Some(py) = python() else {
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("boom.py");
    std::fs::write(
        &path,
        "def process(text, source, target):\n    raise ValueError('boom')\n",
    )
    .unwrap();
    let runner = ScriptRunner::new(py, Duration::from_secs(10));
    let err = runner.run(&request(&path, "")).unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[test]
fn slow_script_times_out() {
    let Some(py) = python() else {
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("slow.py");
    std::fs::write(
        &path,
        "import time\ndef process(text, source, target):\n    time.sleep(30)\n    return 'late'\n",
    )
    .unwrap();
    let runner = ScriptRunner::new(py, Duration::from_secs(1));
    let err = runner.run(&request(&path, "")).unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[test]
fn missing_script_file_is_an_error() {
    let dir = tempdir().unwrap();
    let runner = ScriptRunner::new("python3", Duration::from_secs(1));
    let err = runner
        .run(&request(&dir.path().join("nope.py"), ""))
        .unwrap_err();
    assert!(err.to_string().contains("script file not found"));
}

#[test]
fn command_passes_script_and_modes() {
    let runner = ScriptRunner::new("python3", Duration::from_secs(5));
    let req = ScriptRequest {
        script_path: Path::new("scripts").join("upper.py"),
        input_text: "ignored".into(),
        input_source: InputSource::Selection,
        output_target: OutputTarget::Clipboard,
    };
    let cmd = runner.command(&req);
    assert_eq!(cmd.get_program(), "python3");
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args[0], "-c");
    assert_eq!(args[2], Path::new("scripts").join("upper.py").to_string_lossy());
    assert_eq!(&args[3..], ["selection", "clipboard"]);
    let encoding = cmd
        .get_envs()
        .find(|(k, _)| *k == "PYTHONIOENCODING")
        .and_then(|(_, v)| v);
    assert_eq!(encoding, Some(std::ffi::OsStr::new("utf-8")));
}
