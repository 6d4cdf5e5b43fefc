use crate::command::CommandChain;
use crate::format::{format_output, LogLine};
use crate::log_view::LogView;
use crate::pyenv::{generate_env_name, Pyenv};
use crate::runner::{CommandRunner, JobId, RunnerEvent};
use crate::version_filter::VersionMatcher;
use std::sync::mpsc::Sender;

/// Where a started command goes.
pub trait Dispatch {
    fn dispatch(&mut self, job: JobId, chain: CommandChain);
}

/// One detached worker thread per command, reporting back through `tx`.
pub struct ThreadDispatcher {
    tx: Sender<RunnerEvent>,
}

impl ThreadDispatcher {
    pub fn new(tx: Sender<RunnerEvent>) -> Self {
        Self { tx }
    }
}

impl Dispatch for ThreadDispatcher {
    fn dispatch(&mut self, job: JobId, chain: CommandChain) {
        CommandRunner::spawn(job, chain, self.tx.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Versions,
    Package,
    Log,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Versions => Focus::Package,
            Focus::Package => Focus::Log,
            Focus::Log => Focus::Versions,
        }
    }
}

/// Everything the interface shows, owned by the UI thread.
pub struct App {
    pyenv: Pyenv,
    env_prefix: String,
    versions: Vec<String>,
    matcher: VersionMatcher,
    version_filter: String,
    visible: Vec<usize>,
    cursor: usize,
    package: String,
    focus: Focus,
    log: LogView,
    next_job: JobId,
}

impl App {
    pub fn new(pyenv: Pyenv, env_prefix: impl Into<String>, versions: Vec<String>) -> Self {
        let visible = (0..versions.len()).collect();
        Self {
            pyenv,
            env_prefix: env_prefix.into(),
            versions,
            matcher: VersionMatcher::new(),
            version_filter: String::new(),
            visible,
            cursor: 0,
            package: String::new(),
            focus: Focus::Package,
            log: LogView::new(),
            next_job: 1,
        }
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Indices into `versions()` after filtering, best match first.
    pub fn visible_versions(&self) -> &[usize] {
        &self.visible
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn version_filter(&self) -> &str {
        &self.version_filter
    }

    pub fn selected_version(&self) -> Option<&str> {
        self.visible
            .get(self.cursor)
            .map(|&i| self.versions[i].as_str())
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn filter_push(&mut self, c: char) {
        self.version_filter.push(c);
        self.refilter();
    }

    pub fn filter_pop(&mut self) {
        self.version_filter.pop();
        self.refilter();
    }

    pub fn filter_clear(&mut self) {
        self.version_filter.clear();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = self.matcher.filter(&self.version_filter, &self.versions);
        self.cursor = 0;
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn package_push(&mut self, c: char) {
        self.package.push(c);
    }

    pub fn package_pop(&mut self) {
        self.package.pop();
    }

    pub fn package_clear(&mut self) {
        self.package.clear();
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn log(&self) -> &LogView {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogView {
        &mut self.log
    }

    /// `pip show` for the entered package under the selected version.
    pub fn search<D: Dispatch>(&mut self, dispatcher: &mut D) -> Option<JobId> {
        let version = self.selected_version()?;
        let chain = self.pyenv.search_command(&self.package, version)?;
        Some(self.start(chain, dispatcher))
    }

    /// Create a fresh virtualenv from the selected version and install the
    /// entered package into it.
    pub fn install<D: Dispatch>(&mut self, dispatcher: &mut D) -> Option<JobId> {
        let version = self.selected_version()?.trim();
        let package = self.package.trim();
        if version.is_empty() || package.is_empty() {
            return None;
        }
        let env_name = generate_env_name(&self.env_prefix, package, version);
        let chain = self.pyenv.install_command(package, version, &env_name)?;
        Some(self.start(chain, dispatcher))
    }

    fn start<D: Dispatch>(&mut self, chain: CommandChain, dispatcher: &mut D) -> JobId {
        let job = self.next_job;
        self.next_job += 1;
        self.log.push(LogLine::Running(chain.to_string()));
        dispatcher.dispatch(job, chain);
        job
    }

    pub fn handle_event(&mut self, event: RunnerEvent) {
        self.log.append(format_output(&event.output));
    }
}
