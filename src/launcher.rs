//! Turning a clicked action into work, and delivering that work to the window
//! that had focus before the panel opened.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::action_tree::{PanelPath, MAX_PANEL_DEPTH};
use crate::actions::script::{ScriptRequest, ScriptRunner};
use crate::actions::{exec, keys, Action, ActionKind, InputSource, OutputTarget};
use crate::foreground::ForegroundTracker;

/// Delay between hiding the panels and re-focusing the previous window.
pub const SWITCH_DELAY: Duration = Duration::from_millis(100);
/// Delay between a successful re-focus and running the job.
pub const RUN_DELAY: Duration = Duration::from_millis(200);
/// Wait after Ctrl+C before the selection is read from the clipboard.
pub const SELECTION_DELAY: Duration = Duration::from_millis(150);

/// Everything the executor needs from the operating system.
pub trait Desktop {
    fn switch_to_previous_window(&mut self) -> bool;
    fn send_keys(&mut self, spec: &str) -> anyhow::Result<()>;
    fn type_text(&mut self, text: &str) -> anyhow::Result<()>;
    fn launch_program(&mut self, command: &str, args: &[String]) -> anyhow::Result<()>;
    fn open_url(&mut self, url: &str) -> anyhow::Result<()>;
    fn clipboard_text(&mut self) -> anyhow::Result<String>;
    fn set_clipboard_text(&mut self, text: &str) -> anyhow::Result<()>;
    fn run_script(&mut self, req: &ScriptRequest) -> anyhow::Result<String>;
    /// Save script output to a new file and return its path.
    fn write_output_file(&mut self, content: &str) -> anyhow::Result<PathBuf>;
}

/// The real desktop: Win32 input, the system clipboard and Python.
pub struct SystemDesktop {
    pub foreground: ForegroundTracker,
    pub runner: ScriptRunner,
    output_dir: PathBuf,
}

impl SystemDesktop {
    pub fn new(foreground: ForegroundTracker, runner: ScriptRunner, output_dir: PathBuf) -> Self {
        Self {
            foreground,
            runner,
            output_dir,
        }
    }
}

impl Desktop for SystemDesktop {
    fn switch_to_previous_window(&mut self) -> bool {
        self.foreground.switch_to_previous()
    }

    fn send_keys(&mut self, spec: &str) -> anyhow::Result<()> {
        keys::send(spec)
    }

    fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        keys::type_text(text)
    }

    fn launch_program(&mut self, command: &str, args: &[String]) -> anyhow::Result<()> {
        exec::launch_program(command, args)
    }

    fn open_url(&mut self, url: &str) -> anyhow::Result<()> {
        exec::open_url(url)
    }

    fn clipboard_text(&mut self) -> anyhow::Result<String> {
        let mut cb = arboard::Clipboard::new()?;
        Ok(cb.get_text()?)
    }

    fn set_clipboard_text(&mut self, text: &str) -> anyhow::Result<()> {
        let mut cb = arboard::Clipboard::new()?;
        cb.set_text(text.to_string())?;
        Ok(())
    }

    fn run_script(&mut self, req: &ScriptRequest) -> anyhow::Result<String> {
        self.runner.run(req)
    }

    fn write_output_file(&mut self, content: &str) -> anyhow::Result<PathBuf> {
        write_output_file(&self.output_dir, content)
    }
}

/// Write `output_YYYYMMDD_HHMMSS.txt` into `dir`.
pub fn write_output_file(dir: &Path, content: &str) -> anyhow::Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut path = dir.join(format!("output_{stamp}.txt"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("output_{stamp}_{n}.txt"));
        n += 1;
    }
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptJob {
    pub name: String,
    pub script_path: PathBuf,
    pub input_source: InputSource,
    pub output_target: OutputTarget,
    /// Text entered by the user for [`InputSource::Manual`].
    pub manual_input: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Keys(String),
    Program { command: String, args: Vec<String> },
    Url(String),
    Text(String),
    Script(ScriptJob),
    /// Quick send: copy to the clipboard, then type.
    Snippet(String),
}

impl Job {
    fn describe(&self) -> String {
        match self {
            Job::Keys(k) => format!("keys {k}"),
            Job::Program { command, .. } => format!("program {command}"),
            Job::Url(u) => format!("url {u}"),
            Job::Text(_) => "text".into(),
            Job::Script(s) => format!("script {}", s.name),
            Job::Snippet(_) => "quick send".into(),
        }
    }
}

/// What clicking an action means.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    OpenPanel(PanelPath),
    OpenQuickSend(String),
    Run(Job),
    /// A manual-input script; the GUI asks for the text first.
    NeedsInput(ScriptJob),
    Disabled,
    Unsupported,
    Blocked(String),
}

/// Decide what clicking `action`, found at `idx` of the panel `path`, does.
pub fn dispatch(action: &Action, path: &PanelPath, idx: usize, script_dir: &Path) -> Dispatch {
    if !action.enabled {
        return Dispatch::Disabled;
    }
    match &action.kind {
        ActionKind::Panel { .. } => {
            if path.depth() + 1 >= MAX_PANEL_DEPTH {
                Dispatch::Blocked(format!("maximum panel depth of {MAX_PANEL_DEPTH} reached"))
            } else {
                Dispatch::OpenPanel(path.child(idx))
            }
        }
        ActionKind::QuickSend { filename, .. } => Dispatch::OpenQuickSend(filename.clone()),
        ActionKind::Key { command } => Dispatch::Run(Job::Keys(command.clone())),
        ActionKind::Program { command, args } => Dispatch::Run(Job::Program {
            command: command.clone(),
            args: args.clone(),
        }),
        ActionKind::Url { url } => Dispatch::Run(Job::Url(url.clone())),
        ActionKind::Text { text } => Dispatch::Run(Job::Text(text.clone())),
        ActionKind::InputOutput {
            script_file,
            input_source,
            output_target,
            ..
        } => {
            if script_file.trim().is_empty() {
                return Dispatch::Blocked(format!("'{}' has no script file", action.name));
            }
            let job = ScriptJob {
                name: action.name.clone(),
                script_path: script_dir.join(script_file),
                input_source: *input_source,
                output_target: *output_target,
                manual_input: None,
            };
            if *input_source == InputSource::Manual {
                Dispatch::NeedsInput(job)
            } else {
                Dispatch::Run(Job::Script(job))
            }
        }
        ActionKind::Unknown { .. } => {
            tracing::warn!("unsupported action type for '{}'", action.name);
            Dispatch::Unsupported
        }
    }
}

/// Result of running a job, for the GUI to report.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecEvent {
    Done(String),
    /// Script output destined for the result window.
    ShowResult { title: String, text: String },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Switch,
    Run,
    ReadSelection,
}

#[derive(Debug)]
struct Pending {
    job: Job,
    stage: Stage,
    at: Instant,
}

/// Timed paste-back sequence: re-focus the previous window, wait, run.
///
/// All timing is driven by [`PasteBackQueue::poll`] from the UI loop, so
/// jobs run on the UI thread in order.
#[derive(Debug, Default)]
pub struct PasteBackQueue {
    pending: VecDeque<Pending>,
}

impl PasteBackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job`. The caller hides its own windows at the same time.
    pub fn enqueue(&mut self, job: Job, now: Instant) {
        tracing::debug!("queued {}", job.describe());
        self.pending.push_back(Pending {
            job,
            stage: Stage::Switch,
            at: now + SWITCH_DELAY,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.front().map(|p| p.at)
    }

    /// Advance every step that is due at `now`.
    pub fn poll(&mut self, now: Instant, desktop: &mut dyn Desktop) -> Vec<ExecEvent> {
        let mut events = Vec::new();
        while let Some(front) = self.pending.front_mut() {
            if front.at > now {
                break;
            }
            let stage = front.stage;
            match stage {
                Stage::Switch => {
                    if desktop.switch_to_previous_window() {
                        front.at = now + RUN_DELAY;
                    } else {
                        tracing::debug!("no previous window, running immediately");
                        front.at = now;
                    }
                    front.stage = Stage::Run;
                }
                Stage::Run => {
                    if let Job::Script(s) = &front.job {
                        if s.input_source == InputSource::Selection {
                            if let Err(e) = desktop.send_keys("ctrl+c") {
                                tracing::warn!("failed to copy selection: {e}");
                            }
                            front.stage = Stage::ReadSelection;
                            front.at = now + SELECTION_DELAY;
                            continue;
                        }
                    }
                    if let Some(p) = self.pending.pop_front() {
                        events.push(run_job(p.job, None, desktop));
                    }
                }
                Stage::ReadSelection => {
                    let selected = desktop.clipboard_text().unwrap_or_else(|e| {
                        tracing::warn!("failed to read selection: {e}");
                        String::new()
                    });
                    if let Some(p) = self.pending.pop_front() {
                        events.push(run_job(p.job, Some(selected), desktop));
                    }
                }
            }
        }
        events
    }
}

fn run_job(job: Job, selection: Option<String>, desktop: &mut dyn Desktop) -> ExecEvent {
    let what = job.describe();
    let result = match job {
        Job::Keys(spec) => desktop.send_keys(&spec).map(|_| None),
        Job::Program { command, args } => desktop.launch_program(&command, &args).map(|_| None),
        Job::Url(url) => desktop.open_url(&url).map(|_| None),
        Job::Text(text) => desktop.type_text(&text).map(|_| None),
        Job::Snippet(text) => desktop
            .set_clipboard_text(&text)
            .and_then(|_| desktop.type_text(&text))
            .map(|_| None),
        Job::Script(s) => run_script_job(&s, selection, desktop),
    };
    match result {
        Ok(Some(event)) => event,
        Ok(None) => {
            tracing::info!("executed {what}");
            ExecEvent::Done(what)
        }
        Err(e) => {
            tracing::error!("failed to execute {what}: {e:#}");
            ExecEvent::Failed(format!("{what}: {e:#}"))
        }
    }
}

fn run_script_job(
    job: &ScriptJob,
    selection: Option<String>,
    desktop: &mut dyn Desktop,
) -> anyhow::Result<Option<ExecEvent>> {
    let input_text = match job.input_source {
        InputSource::Clipboard => desktop.clipboard_text().unwrap_or_else(|e| {
            tracing::warn!("failed to read clipboard: {e}");
            String::new()
        }),
        InputSource::Selection => selection.unwrap_or_default(),
        InputSource::Manual => job.manual_input.clone().unwrap_or_default(),
        InputSource::None => String::new(),
    };
    let req = ScriptRequest {
        script_path: job.script_path.clone(),
        input_text,
        input_source: job.input_source,
        output_target: job.output_target,
    };
    let output = desktop.run_script(&req)?;

    match job.output_target {
        OutputTarget::Text => desktop.type_text(&output)?,
        OutputTarget::Url => desktop.open_url(output.trim())?,
        OutputTarget::Clipboard => desktop.set_clipboard_text(&output)?,
        OutputTarget::File => {
            let path = desktop.write_output_file(&output)?;
            tracing::info!("script output saved to {}", path.display());
            return Ok(Some(ExecEvent::Done(format!(
                "output saved to {}",
                path.display()
            ))));
        }
        OutputTarget::Window => {
            return Ok(Some(ExecEvent::ShowResult {
                title: job.name.clone(),
                text: output,
            }))
        }
    }
    Ok(None)
}
