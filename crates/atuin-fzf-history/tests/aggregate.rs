//! Aggregation across scripted history sources.
//!
//! Each query is answered from a fixed script keyed by its filter mode, and
//! every spec the aggregator issues is recorded for inspection.

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use atuin_fzf_history::{
    Aggregator, EntryStream, FilterMode, HistoryEntry, HistoryError, HistorySource, PumpOutcome,
    QuerySpec, StreamBridge,
};
use futures::{StreamExt, stream};
use pretty_assertions::assert_eq;

#[derive(Clone)]
enum Step {
    Entry(HistoryEntry),
    Fail,
}

#[derive(Default)]
struct ScriptedSource {
    scripts: HashMap<Option<String>, Vec<Step>>,
    unstartable: Option<Option<String>>,
    issued: Mutex<Vec<QuerySpec>>,
    pulled: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn script(mut self, filter_mode: Option<&str>, steps: Vec<Step>) -> Self {
        self.scripts.insert(filter_mode.map(str::to_string), steps);
        self
    }

    fn fail_to_start(mut self, filter_mode: Option<&str>) -> Self {
        self.unstartable = Some(filter_mode.map(str::to_string));
        self
    }

    fn issued(&self) -> Vec<QuerySpec> {
        self.issued.lock().unwrap().clone()
    }
}

impl HistorySource for ScriptedSource {
    fn query(&self, spec: &QuerySpec) -> Result<EntryStream, HistoryError> {
        self.issued.lock().unwrap().push(spec.clone());

        if self.unstartable.as_ref() == Some(&spec.filter_mode) {
            return Err(HistoryError::Startup {
                program: "atuin".to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        let steps = self
            .scripts
            .get(&spec.filter_mode)
            .cloned()
            .unwrap_or_default();
        let pulled = self.pulled.clone();

        Ok(Box::pin(stream::iter(steps).map(move |step| {
            pulled.fetch_add(1, Ordering::SeqCst);
            match step {
                Step::Entry(entry) => Ok(entry),
                Step::Fail => Err(HistoryError::Stream(io::Error::other("scripted failure"))),
            }
        })))
    }
}

fn entry(command: &str, directory: &str) -> HistoryEntry {
    HistoryEntry {
        time: "2024-01-01 10:00:00".to_string(),
        relative_time: "1h".to_string(),
        duration: "10ms".to_string(),
        exit: "0".to_string(),
        directory: directory.to_string(),
        command: command.to_string(),
    }
}

async fn commands(stream: EntryStream) -> Vec<(String, String)> {
    stream
        .map(|item| {
            let e = item.expect("unexpected stream failure");
            (e.command, e.directory)
        })
        .collect()
        .await
}

fn pair(command: &str, directory: &str) -> (String, String) {
    (command.to_string(), directory.to_string())
}

#[tokio::test]
async fn all_prefers_the_session_copy() {
    let source = ScriptedSource::default()
        .script(
            None,
            vec![Step::Entry(entry("ls", "/a")), Step::Entry(entry("cd", "/b"))],
        )
        .script(Some("session"), vec![Step::Entry(entry("ls", "/a"))]);
    let aggregator = Aggregator::new(source, "/a", 1000);

    let merged = commands(aggregator.fetch(FilterMode::All, "q").unwrap()).await;
    assert_eq!(merged, vec![pair("cd", "/b"), pair("ls", "/a")]);

    let issued = aggregator.source().issued();
    assert_eq!(issued.len(), 2);
    assert_eq!(issued[0].filter_mode, None);
    assert_eq!(issued[1].filter_mode.as_deref(), Some("session"));
    assert!(issued.iter().all(|s| s.query == "q" && s.limit == 1000));
}

#[tokio::test]
async fn directory_and_workspace_pass_through() {
    for mode in [FilterMode::Directory, FilterMode::Workspace] {
        let name = mode.to_string();
        let source = ScriptedSource::default().script(
            Some(&name),
            vec![Step::Entry(entry("make", "/x")), Step::Entry(entry("make", "/x"))],
        );
        let aggregator = Aggregator::new(source, "/elsewhere", 50);

        let got = commands(aggregator.fetch(mode, "make").unwrap()).await;
        // No dedup and no cwd filtering for source-side modes.
        assert_eq!(got, vec![pair("make", "/x"), pair("make", "/x")]);

        let issued = aggregator.source().issued();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].filter_mode.as_deref(), Some(name.as_str()));
        assert_eq!(issued[0].limit, 50);
    }
}

#[tokio::test]
async fn subtree_filters_the_merged_history() {
    let source = ScriptedSource::default()
        .script(
            None,
            vec![
                Step::Entry(entry("vim", "/home/al/src")),
                Step::Entry(entry("top", "/home/alpha")),
                Step::Entry(entry("ls", "/home/al")),
            ],
        )
        .script(Some("session"), vec![Step::Entry(entry("make", "/home/al"))]);
    let aggregator = Aggregator::new(source, "/home/al", 1000);

    let got = commands(aggregator.fetch(FilterMode::Subtree, "").unwrap()).await;
    assert_eq!(
        got,
        vec![
            pair("vim", "/home/al/src"),
            pair("ls", "/home/al"),
            pair("make", "/home/al"),
        ]
    );
}

#[tokio::test]
async fn startup_failure_fails_the_whole_fetch() {
    let source = ScriptedSource::default()
        .script(None, vec![Step::Entry(entry("ls", "/a"))])
        .fail_to_start(Some("session"));
    let aggregator = Aggregator::new(source, "/a", 1000);

    match aggregator.fetch(FilterMode::All, "") {
        Err(HistoryError::Startup { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("fetch should not start"),
    }
    assert_eq!(aggregator.source().pulled.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_mid_stream_reaches_the_bridge() {
    let source = ScriptedSource::default().script(
        Some("directory"),
        vec![
            Step::Entry(entry("one", "/a")),
            Step::Entry(entry("two", "/a")),
            Step::Fail,
            Step::Entry(entry("four", "/a")),
            Step::Entry(entry("five", "/a")),
        ],
    );
    let aggregator = Aggregator::new(source, "/a", 1000);
    let bridge = StreamBridge::new("/a");

    let mut out = Vec::new();
    let result = bridge
        .pump(aggregator.fetch(FilterMode::Directory, "").unwrap(), &mut out)
        .await;

    assert!(matches!(result, Err(HistoryError::Stream(_))));
    let records: Vec<_> = out.split(|b| *b == 0).filter(|r| !r.is_empty()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(aggregator.source().pulled.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn bridge_reports_every_record_written() {
    let source = ScriptedSource::default()
        .script(None, vec![Step::Entry(entry("a", "/")), Step::Entry(entry("b", "/"))])
        .script(Some("session"), vec![Step::Entry(entry("c", "/"))]);
    let aggregator = Aggregator::new(source, "/", 1000);
    let bridge = StreamBridge::new("/");

    let mut out = Vec::new();
    let outcome = bridge
        .pump(aggregator.fetch(FilterMode::All, "").unwrap(), &mut out)
        .await
        .unwrap();

    assert_eq!(outcome, PumpOutcome::Exhausted { records: 3 });
}
