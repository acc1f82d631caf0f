use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use quick_panel::action_tree::PanelPath;
use quick_panel::actions::script::ScriptRequest;
use quick_panel::actions::{Action, ActionKind, InputSource, OutputTarget};
use quick_panel::launcher::{
    dispatch, write_output_file, Desktop, Dispatch, ExecEvent, Job, PasteBackQueue, ScriptJob,
};
use tempfile::tempdir;

/// Records every call instead of touching the real desktop.
#[derive(Default)]
struct FakeDesktop {
    can_switch: bool,
    clipboard: String,
    script_output: Option<String>,
    calls: Vec<String>,
}

impl Desktop for FakeDesktop {
    fn switch_to_previous_window(&mut self) -> bool {
        self.calls.push("switch".into());
        self.can_switch
    }

    fn send_keys(&mut self, spec: &str) -> anyhow::Result<()> {
        self.calls.push(format!("keys:{spec}"));
        if spec == "ctrl+c" {
            self.clipboard = "selected words".into();
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.calls.push(format!("type:{text}"));
        Ok(())
    }

    fn launch_program(&mut self, command: &str, args: &[String]) -> anyhow::Result<()> {
        self.calls.push(format!("launch:{command}:{}", args.join(" ")));
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> anyhow::Result<()> {
        self.calls.push(format!("url:{url}"));
        Ok(())
    }

    fn clipboard_text(&mut self) -> anyhow::Result<String> {
        Ok(self.clipboard.clone())
    }

    fn set_clipboard_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.calls.push(format!("clip:{text}"));
        self.clipboard = text.to_string();
        Ok(())
    }

    fn run_script(&mut self, req: &ScriptRequest) -> anyhow::Result<String> {
        self.calls.push(format!("script:{}", req.input_text));
        match &self.script_output {
            Some(out) => Ok(out.clone()),
            None => anyhow::bail!("script crashed"),
        }
    }

    fn write_output_file(&mut self, content: &str) -> anyhow::Result<PathBuf> {
        self.calls.push(format!("file:{content}"));
        Ok(PathBuf::from("out.txt"))
    }
}

fn script_action(source: InputSource, target: OutputTarget) -> Action {
    Action::new(
        "Upper",
        ActionKind::InputOutput {
            script_file: "upper.py".into(),
            input_source: source,
            output_target: target,
            description: String::new(),
        },
    )
}

fn script_job(source: InputSource, target: OutputTarget) -> ScriptJob {
    ScriptJob {
        name: "Upper".into(),
        script_path: PathBuf::from("scripts/upper.py"),
        input_source: source,
        output_target: target,
        manual_input: None,
    }
}

#[test]
fn dispatch_simple_actions() {
    let dir = Path::new("scripts");
    let root = PanelPath::root();
    let url = Action::new("Docs", ActionKind::Url { url: "https://example.com".into() });
    assert_eq!(
        dispatch(&url, &root, 0, dir),
        Dispatch::Run(Job::Url("https://example.com".into()))
    );

    let prog = Action::new(
        "Editor",
        ActionKind::Program {
            command: "notepad".into(),
            args: vec!["a.txt".into()],
        },
    );
    assert_eq!(
        dispatch(&prog, &root, 0, dir),
        Dispatch::Run(Job::Program {
            command: "notepad".into(),
            args: vec!["a.txt".into()],
        })
    );

    let mut off = Action::new("Off", ActionKind::Text { text: "x".into() });
    off.enabled = false;
    assert_eq!(dispatch(&off, &root, 0, dir), Dispatch::Disabled);

    let unknown: Action = serde_json::from_str(r#"{"type":"teleport","name":"T"}"#).unwrap();
    assert_eq!(dispatch(&unknown, &root, 0, dir), Dispatch::Unsupported);

    let qs = Action::new(
        "Replies",
        ActionKind::QuickSend {
            filename: "replies".into(),
            description: String::new(),
        },
    );
    assert_eq!(
        dispatch(&qs, &root, 0, dir),
        Dispatch::OpenQuickSend("replies".into())
    );
}

#[test]
fn dispatch_panels_respects_depth() {
    let panel = Action::new("Sub", ActionKind::Panel { actions: Vec::new() });
    let dir = Path::new("scripts");
    assert_eq!(
        dispatch(&panel, &PanelPath(vec![1]), 2, dir),
        Dispatch::OpenPanel(PanelPath(vec![1, 2]))
    );
    assert!(matches!(
        dispatch(&panel, &PanelPath(vec![0, 0, 0, 0]), 0, dir),
        Dispatch::Blocked(_)
    ));
}

#[test]
fn dispatch_scripts() {
    let dir = Path::new("scripts");
    let root = PanelPath::root();
    assert_eq!(
        dispatch(&script_action(InputSource::Clipboard, OutputTarget::Text), &root, 0, dir),
        Dispatch::Run(Job::Script(script_job(InputSource::Clipboard, OutputTarget::Text)))
    );
    assert_eq!(
        dispatch(&script_action(InputSource::Manual, OutputTarget::Window), &root, 0, dir),
        Dispatch::NeedsInput(script_job(InputSource::Manual, OutputTarget::Window))
    );

    let mut missing = script_action(InputSource::None, OutputTarget::Text);
    if let ActionKind::InputOutput { script_file, .. } = &mut missing.kind {
        script_file.clear();
    }
    assert!(matches!(dispatch(&missing, &root, 0, dir), Dispatch::Blocked(_)));
}

#[test]
fn paste_back_waits_for_focus_switch() {
    let mut desktop = FakeDesktop {
        can_switch: true,
        ..Default::default()
    };
    let mut queue = PasteBackQueue::new();
    let t0 = Instant::now();
    queue.enqueue(Job::Text("hello".into()), t0);

    assert!(queue.poll(t0 + Duration::from_millis(50), &mut desktop).is_empty());
    assert!(desktop.calls.is_empty());

    let t1 = t0 + Duration::from_millis(100);
    assert!(queue.poll(t1, &mut desktop).is_empty());
    assert_eq!(desktop.calls, ["switch"]);

    assert!(queue.poll(t1 + Duration::from_millis(150), &mut desktop).is_empty());
    let events = queue.poll(t1 + Duration::from_millis(200), &mut desktop);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ExecEvent::Done(_)));
    assert_eq!(desktop.calls, ["switch", "type:hello"]);
    assert!(queue.is_empty());
}

#[test]
fn paste_back_runs_immediately_without_previous_window() {
    let mut desktop = FakeDesktop::default();
    let mut queue = PasteBackQueue::new();
    let t0 = Instant::now();
    queue.enqueue(Job::Keys("ctrl+v".into()), t0);
    queue.enqueue(Job::Snippet("hi".into()), t0);
    assert_eq!(queue.len(), 2);

    let events = queue.poll(t0 + Duration::from_millis(100), &mut desktop);
    // the second job is due as well once the first has run
    assert_eq!(events.len(), 2);
    assert_eq!(
        desktop.calls,
        ["switch", "keys:ctrl+v", "switch", "clip:hi", "type:hi"]
    );
}

#[test]
fn selection_is_copied_before_script_runs() {
    let mut desktop = FakeDesktop {
        can_switch: true,
        script_output: Some("SELECTED WORDS".into()),
        ..Default::default()
    };
    let mut queue = PasteBackQueue::new();
    let t0 = Instant::now();
    queue.enqueue(
        Job::Script(script_job(InputSource::Selection, OutputTarget::Clipboard)),
        t0,
    );
    let t_run = t0 + Duration::from_millis(300);
    queue.poll(t0 + Duration::from_millis(100), &mut desktop);
    assert!(queue.poll(t_run, &mut desktop).is_empty());
    assert_eq!(desktop.calls, ["switch", "keys:ctrl+c"]);

    assert!(queue.poll(t_run + Duration::from_millis(100), &mut desktop).is_empty());
    let events = queue.poll(t_run + Duration::from_millis(150), &mut desktop);
    assert_eq!(events.len(), 1);
    assert_eq!(
        desktop.calls,
        [
            "switch",
            "keys:ctrl+c",
            "script:selected words",
            "clip:SELECTED WORDS"
        ]
    );
}

#[test]
fn script_output_targets() {
    let t0 = Instant::now();
    let later = t0 + Duration::from_secs(1);

    let mut desktop = FakeDesktop {
        clipboard: "abc".into(),
        script_output: Some("ABC".into()),
        ..Default::default()
    };
    let mut queue = PasteBackQueue::new();
    queue.enqueue(
        Job::Script(script_job(InputSource::Clipboard, OutputTarget::Window)),
        t0,
    );
    queue.enqueue(
        Job::Script(script_job(InputSource::None, OutputTarget::File)),
        t0,
    );
    let mut manual = script_job(InputSource::Manual, OutputTarget::Url);
    manual.manual_input = Some("typed".into());
    queue.enqueue(Job::Script(manual), t0);

    let events = queue.poll(later, &mut desktop);
    assert_eq!(
        events[0],
        ExecEvent::ShowResult {
            title: "Upper".into(),
            text: "ABC".into(),
        }
    );
    assert!(matches!(&events[1], ExecEvent::Done(msg) if msg.contains("out.txt")));
    assert!(matches!(events[2], ExecEvent::Done(_)));
    assert!(desktop.calls.contains(&"script:abc".to_string()));
    assert!(desktop.calls.contains(&"script:".to_string()));
    assert!(desktop.calls.contains(&"script:typed".to_string()));
    assert!(desktop.calls.contains(&"url:ABC".to_string()));
}

#[test]
fn script_failure_is_reported() {
    let mut desktop = FakeDesktop::default();
    let mut queue = PasteBackQueue::new();
    let t0 = Instant::now();
    queue.enqueue(
        Job::Script(script_job(InputSource::None, OutputTarget::Text)),
        t0,
    );
    let events = queue.poll(t0 + Duration::from_secs(1), &mut desktop);
    assert!(matches!(&events[0], ExecEvent::Failed(msg) if msg.contains("script crashed")));
}

#[test]
fn output_files_get_unique_names() {
    let dir = tempdir().unwrap();
    let first = write_output_file(dir.path(), "one").unwrap();
    let second = write_output_file(dir.path(), "two").unwrap();
    assert_ne!(first, second);
    assert_eq!(std::fs::read_to_string(&first).unwrap(), "one");
    assert_eq!(std::fs::read_to_string(&second).unwrap(), "two");
    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("output_") && name.ends_with(".txt"));
}
