//! Running fzf as the selector.
//!
//! Records are pumped into fzf's stdin from a separate task while fzf runs.
//! Whatever fzf prints on exit is the selection.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use atuin_fzf_history::{
    EntryStream, StreamBridge,
    bridge::field,
    entry::FIELD_DELIMITER,
};
use eyre::{Result, WrapErr, bail, eyre};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::commands::shell_quote;

pub const HEADER: &str = "[Enter] select  [Ctrl-O] cd & use  [Ctrl-Y] yank  [Ctrl-R] dir filter";

/// fzf exit code when the user aborted.
const EXIT_INTERRUPTED: i32 = 130;
/// fzf exit code when nothing matched the query.
const EXIT_NO_MATCH: i32 = 1;

/// What the user picked, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Picked(String),
    Nothing,
}

/// Placeholder for the command field and everything after it.
fn command_placeholder() -> String {
    format!("{{{}..}}", field::COMMAND)
}

pub struct Fzf {
    program: PathBuf,
    self_exe: PathBuf,
    height: String,
}

impl Fzf {
    pub fn new(program: impl Into<PathBuf>, self_exe: impl Into<PathBuf>, height: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            self_exe: self_exe.into(),
            height: height.into(),
        }
    }

    fn exe(&self) -> String {
        shell_quote(&self.self_exe)
    }

    /// Full argument list for an interactive search seeded with `query`.
    pub fn args(&self, query: &str, prompt: &str) -> Vec<String> {
        let exe = self.exe();
        let command = command_placeholder();

        let with_nth = format!(
            "{command}  {{{}}} {{{}}}",
            field::EXIT_LABEL,
            field::DIR_CONTEXT
        );

        vec![
            "--read0".into(),
            "--tac".into(),
            "--ansi".into(),
            "--scheme".into(),
            "history".into(),
            "--prompt".into(),
            format!("{prompt}> "),
            "--header".into(),
            HEADER.into(),
            "--preview".into(),
            format!("{exe} preview {{}}"),
            "--preview-window".into(),
            "right:40%:wrap,<50(hidden)".into(),
            "--delimiter".into(),
            FIELD_DELIMITER.into(),
            "--with-nth".into(),
            with_nth,
            "--accept-nth".into(),
            command.clone(),
            "--bind".into(),
            format!("ctrl-y:execute-silent(printf '%s' {command} | {exe} clip)+abort"),
            "--bind".into(),
            format!(
                "ctrl-o:become(printf 'CHDIR:\\t%s\\t%s' {{{}}} {command})",
                field::DIRECTORY
            ),
            "--bind".into(),
            format!("ctrl-r:transform({exe} fzf-actions {{fzf:prompt}})"),
            "--query".into(),
            query.into(),
            "--height".into(),
            self.height.clone(),
        ]
    }

    /// Run fzf over `entries` and wait for the user.
    ///
    /// Production stops on its own once fzf closes its input. If fzf exits
    /// while the producer is still waiting on upstream history, the producer
    /// is aborted, which kills the history queries behind it.
    pub async fn select(
        &self,
        bridge: StreamBridge,
        entries: EntryStream,
        query: &str,
        prompt: &str,
    ) -> Result<Selection> {
        let mut child = Command::new(&self.program)
            .args(self.args(query, prompt))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .wrap_err_with(|| format!("could not run {}", display(&self.program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| eyre!("fzf stdin was not captured"))?;

        let producer = tokio::spawn(async move { bridge.pump(entries, stdin).await });

        let output = child.wait_with_output().await.wrap_err("fzf failed")?;

        if producer.is_finished() {
            match producer.await {
                Ok(Ok(outcome)) => debug!(records = outcome.records(), "history delivered to fzf"),
                Ok(Err(e)) => return Err(e).wrap_err("history search failed"),
                Err(e) => warn!("history producer panicked: {e}"),
            }
        } else {
            debug!("fzf exited before history was exhausted");
            producer.abort();
        }

        match output.status.code() {
            Some(0) => Ok(Selection::Picked(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            )),
            Some(EXIT_INTERRUPTED) | Some(EXIT_NO_MATCH) => Ok(Selection::Nothing),
            _ => bail!("fzf exited with {}", output.status),
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn command_is_read_from_the_last_field_onwards() {
        let fzf = Fzf::new("fzf", "/usr/local/bin/atuin-fzf", "80%");
        let args = fzf.args("git", "all");

        assert_eq!(value_after(&args, "--accept-nth"), ["{8..}"]);
        assert_eq!(value_after(&args, "--with-nth"), ["{8..}  {6} {7}"]);
        assert_eq!(value_after(&args, "--delimiter"), ["\t:::\t"]);
        assert_eq!(value_after(&args, "--query"), ["git"]);
        assert_eq!(value_after(&args, "--prompt"), ["all> "]);
        assert!(args.contains(&"--read0".to_string()));
    }

    #[test]
    fn bindings_call_back_into_this_binary() {
        let fzf = Fzf::new("fzf", "/opt/my tools/atuin-fzf", "50%");
        let args = fzf.args("", "all");
        let binds = value_after(&args, "--bind");

        assert_eq!(binds.len(), 3);
        assert!(binds[0].starts_with("ctrl-y:"));
        assert!(binds[0].contains("'/opt/my tools/atuin-fzf' clip"));
        assert!(binds[1].contains("CHDIR:"));
        assert!(binds[1].contains("{2} {8..}"));
        assert_eq!(
            binds[2],
            "ctrl-r:transform('/opt/my tools/atuin-fzf' fzf-actions {fzf:prompt})"
        );
        assert_eq!(
            value_after(&args, "--preview"),
            ["'/opt/my tools/atuin-fzf' preview {}"]
        );
        assert_eq!(value_after(&args, "--height"), ["50%"]);
    }
}
