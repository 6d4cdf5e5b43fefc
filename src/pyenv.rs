use crate::command::{CommandChain, CommandSpec};
use crate::i18n::I18n;
use chrono::Utc;
use colored::*;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::io;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

// Leading "*" marks the active version; anything after the first token
// ("(set by ...)", "--> /path") is annotation.
static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\*\s*)?(\S+)").expect("valid version regex"));

static NEXT_SALT: AtomicU64 = AtomicU64::new(0);

/// Why the startup version listing produced nothing.
#[derive(Debug)]
pub enum ListError {
    NotFound,
    Failed(Option<i32>),
    Io(io::Error),
}

/// Command builder for one `pyenv` executable.
#[derive(Debug, Clone)]
pub struct Pyenv {
    program: String,
}

impl Pyenv {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Blocking `pyenv versions`.
    pub fn list_versions(&self) -> Result<Vec<String>, ListError> {
        let output = Command::new(&self.program)
            .arg("versions")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ListError::NotFound,
                _ => ListError::Io(e),
            })?;
        if !output.status.success() {
            return Err(ListError::Failed(output.status.code()));
        }
        Ok(parse_versions(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Like `list_versions`, but failures are only noted on the console and
    /// degrade to an empty list.
    pub fn load_versions(&self, i18n: &I18n) -> Vec<String> {
        match self.list_versions() {
            Ok(versions) => versions,
            Err(ListError::NotFound) => {
                eprintln!("{}", i18n.t_format("pyenv_not_found", &[&self.program]).yellow());
                Vec::new()
            }
            Err(ListError::Failed(code)) => {
                let code = code.map_or_else(|| "?".to_string(), |c| c.to_string());
                eprintln!("{}", i18n.t_format("pyenv_versions_failed", &[&self.program, &code]).yellow());
                Vec::new()
            }
            Err(ListError::Io(err)) => {
                eprintln!("{}", i18n.t_format("pyenv_versions_io", &[&self.program, &err.to_string()]).yellow());
                Vec::new()
            }
        }
    }

    /// `pip show <package>` under the selected interpreter.
    pub fn search_command(&self, package: &str, version: &str) -> Option<CommandChain> {
        let (package, version) = (package.trim(), version.trim());
        if package.is_empty() || version.is_empty() {
            return None;
        }
        Some(self.pip(version, ["show", package]).into())
    }

    /// Create `env_name` from `version`, then install `package` into it.
    pub fn install_command(&self, package: &str, version: &str, env_name: &str) -> Option<CommandChain> {
        let (package, version) = (package.trim(), version.trim());
        if package.is_empty() || version.is_empty() || env_name.is_empty() {
            return None;
        }
        let create = CommandSpec::new(&self.program).args(["virtualenv", version, env_name]);
        Some(CommandChain::single(create).then(self.pip(env_name, ["install", package])))
    }

    fn pip<const N: usize>(&self, target: &str, pip_args: [&str; N]) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(["exec", "python", "-m", "pip"])
            .args(pip_args)
            .env("PYENV_VERSION", target)
    }
}

pub fn parse_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| VERSION_LINE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// `<prefix>-<package slug>-<8 hex>`; unique per call.
pub fn generate_env_name(prefix: &str, package: &str, version: &str) -> String {
    let mut slug = String::new();
    for c in package.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    let mut hasher = Sha256::new();
    hasher.update(package.as_bytes());
    hasher.update(version.as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(NEXT_SALT.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let id = hex::encode(&hasher.finalize()[..4]);

    [prefix, slug, id.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-")
}


#[cfg(all(test, unix))]
mod script_tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn fake_pyenv(dir: &tempfile::TempDir, body: &str) -> anyhow::Result<String> {
        let path = dir.path().join("pyenv");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path.to_string_lossy().to_string())
    }

    #[test]
    fn lists_versions_from_executable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let program = fake_pyenv(&dir, "printf '3.11.4\\n3.10.9\\n'")?;
        let versions = Pyenv::new(program).load_versions(&I18n::new("en"));
        assert_eq!(versions, vec!["3.11.4", "3.10.9"]);
        Ok(())
    }

    #[test]
    fn failing_listing_degrades_to_empty() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let program = fake_pyenv(&dir, "echo 3.11.4; exit 2")?;
        let pyenv = Pyenv::new(program);
        assert!(matches!(pyenv.list_versions(), Err(ListError::Failed(Some(2)))));
        assert!(pyenv.load_versions(&I18n::new("en")).is_empty());
        Ok(())
    }
}
