use crate::command::{CommandChain, CommandSpec};
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::process::{ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Data(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerEvent {
    pub job: JobId,
    pub output: Output,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Zero, one or two outputs: stdout first, then stderr, empty streams skipped.
    pub fn into_outputs(self) -> Vec<Output> {
        let mut outputs = Vec::new();
        if !self.stdout.is_empty() {
            outputs.push(Output::Data(self.stdout));
        }
        if !self.stderr.is_empty() {
            outputs.push(Output::Error(self.stderr));
        }
        outputs
    }
}

pub struct CommandRunner;

impl CommandRunner {
    /// Run `chain` on its own thread and send its outputs back through `tx`.
    pub fn spawn(job: JobId, chain: CommandChain, tx: Sender<RunnerEvent>) -> JoinHandle<()> {
        thread::spawn(move || {
            for output in Self::run_chain(&chain).into_outputs() {
                // Receiver gone means the UI has exited.
                if tx.send(RunnerEvent { job, output }).is_err() {
                    break;
                }
            }
        })
    }

    /// Run every step in order, stopping after the first step that fails to
    /// start or exits unsuccessfully.
    pub fn run_chain(chain: &CommandChain) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        for step in chain.steps() {
            match Self::execute(step) {
                Ok((status, stdout, stderr)) => {
                    result.stdout.push_str(&stdout);
                    result.stderr.push_str(&stderr);
                    if !status.success() {
                        break;
                    }
                }
                Err(err) => {
                    result
                        .stderr
                        .push_str(&format!("failed to start {}: {:#}\n", step.program, err));
                    break;
                }
            }
        }
        result
    }

    fn execute(step: &CommandSpec) -> Result<(ExitStatus, String, String)> {
        let mut child = step
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr not captured"))?;

        // Both pipes are drained concurrently so a chatty stderr cannot block stdout.
        let stdout_handle = thread::spawn(move || drain(stdout));
        let stderr_handle = thread::spawn(move || drain(stderr));

        let status = child.wait().context("waiting for process")?;

        let stdout_bytes = stdout_handle
            .join()
            .map_err(|_| anyhow!("stdout reader panicked"))??;
        let stderr_bytes = stderr_handle
            .join()
            .map_err(|_| anyhow!("stderr reader panicked"))??;

        Ok((
            status,
            String::from_utf8_lossy(&stdout_bytes).to_string(),
            String::from_utf8_lossy(&stderr_bytes).to_string(),
        ))
    }
}

fn drain<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut collected = Vec::new();
    reader.read_to_end(&mut collected)?;
    Ok(collected)
}
