use std::time::{Duration, Instant};

use configsync_engine::io::{BufferKind, StateStore};
use configsync_engine::remote::FetchError;
use configsync_engine::sync::{
    ConfigEdit, ConfigSession, ConfigView, KeywordEdit, KeywordSession, LoadSource, NoRender,
};
use configsync_engine::versions::{VersionManifest, VersionStatus, check_buffers};
use configsync_engine::yaml::ListItem;
use configsync_engine::KeywordList;
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

#[test]
fn config_edits_persist_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let start = Instant::now();

    let mut session = ConfigSession::new("", NoRender);
    let report = session.on_external_load(&fixture("config.yaml"), LoadSource::Template, start);
    assert!(report.is_valid());

    session.on_user_edit(&ConfigEdit::set("rss", "enabled", true), start);
    let feeds = vec![ListItem::Scalar("https://lobste.rs/rss".into())];
    session.on_user_edit(
        &ConfigEdit::ReplaceList {
            module: "rss".into(),
            path: "feeds".into(),
            items: feeds.clone(),
        },
        start + Duration::from_millis(400),
    );

    assert!(!session.flush_if_due(start + Duration::from_millis(1200), &store));
    assert!(session.flush_if_due(start + Duration::from_millis(1400), &store));

    let saved = store.load(BufferKind::Config).unwrap().unwrap();
    let mut reloaded = ConfigSession::new("", NoRender);
    reloaded.on_external_load(&saved, LoadSource::Storage, Instant::now());
    assert!(!reloaded.buffer().is_dirty());
    assert_eq!(reloaded.view().list("rss", "feeds"), feeds);
    assert_eq!(
        reloaded.view().module("rss").and_then(|m| m.enabled),
        Some(true)
    );
    assert!(saved.contains("  # kept for later\n  poll_minutes: 30\n"));
}

#[test]
fn config_views_follow_every_edit() {
    let mut seen: Vec<Vec<(String, Option<bool>)>> = Vec::new();
    let mut session = ConfigSession::new(&fixture("config.yaml"), |view: &ConfigView| {
        seen.push(
            view.modules
                .iter()
                .map(|m| (m.key.clone(), m.enabled))
                .collect(),
        )
    });
    let now = Instant::now();
    session.on_user_edit(&ConfigEdit::set("app", "enabled", false), now);
    session.on_user_edit(&ConfigEdit::set("notification", "enabled", true), now);
    drop(session);

    assert_eq!(seen.len(), 2);
    let last: Vec<_> = seen[1].iter().map(|(k, e)| (k.as_str(), *e)).collect();
    assert_eq!(
        last,
        vec![
            ("app", Some(false)),
            ("platforms", Some(true)),
            ("rss", Some(false)),
            ("display", None),
            ("notification", Some(true)),
        ]
    );
}

#[test]
fn keyword_session_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let text = fixture("frequency_words.txt");

    let mut session = KeywordSession::new(&text, NoRender);
    let now = Instant::now();
    session.on_user_edit(
        &KeywordEdit::SetKeywords {
            index: 0,
            keywords: vec!["ChatGPT".into(), "Claude".into()],
        },
        now,
    );
    session.on_user_edit(&KeywordEdit::MoveGroup { from: 3, to: 0 }, now);
    assert!(session.flush(&store));
    assert!(!session.flush(&store));

    let saved = store.load(BufferKind::Keywords).unwrap().unwrap();
    let list = configsync_engine::parse(&saved);
    assert_eq!(list.groups[0].summary(), "apple => Apple");
    assert_eq!(list.groups[1].summary(), "[AI] ChatGPT Claude");
    assert_eq!(configsync_engine::serialize(&list, Some(&saved)), saved);
}

#[test]
fn keyword_remote_failure_leaves_buffer() {
    let text = fixture("frequency_words.txt");
    let mut renders = 0;
    let mut session = KeywordSession::new(&text, |_: &KeywordList| renders += 1);
    let fetcher = |url: &str| -> Result<String, FetchError> {
        Err(FetchError::Transport {
            url: url.to_string(),
            message: "offline".into(),
        })
    };
    assert!(session.load_remote(&fetcher, "mem://words", Instant::now()).is_err());
    assert_eq!(session.text(), text);
    drop(session);
    assert_eq!(renders, 0);
}

#[test]
fn both_buffers_are_checked_against_manifest() {
    let manifest = VersionManifest::parse("config.yaml=1.3.0\nfrequency_words.txt=1.0.3\n");
    let config = fixture("config.yaml");
    let words = fixture("frequency_words.txt");
    let reports = check_buffers(
        &manifest,
        &[
            (BufferKind::Config.file_name(), config.as_str()),
            (BufferKind::Keywords.file_name(), words.as_str()),
        ],
    );
    let statuses: Vec<_> = reports.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![VersionStatus::Outdated, VersionStatus::UpToDate]);
}
