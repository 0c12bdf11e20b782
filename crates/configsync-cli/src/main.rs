use anyhow::Result;
use configsync_config::{Config, RemoteConfig};
use configsync_engine::keywords::GroupKind;
use configsync_engine::sync::NoRender;
use configsync_engine::{
    BufferKind, ConfigEdit, ConfigSession, Fetch, HttpFetcher, KeywordEdit, KeywordSession,
    LoadSource, StateStore, Version, VersionManifest, check_buffers,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
};
use std::{
    env,
    fs::OpenOptions,
    io::{Stdout, stdout},
    ops::Range,
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

const LOG_FILE: &str = "configsync.log";
const TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Config,
    Keywords,
}

struct App {
    store: StateStore,
    remote: RemoteConfig,
    fetcher: HttpFetcher,
    config: ConfigSession<NoRender>,
    keywords: KeywordSession<NoRender>,
    tab: Tab,
    config_list_state: ListState,
    keyword_list_state: ListState,
    status: String,
}

impl App {
    fn new(store: StateStore, settings: &Config) -> Result<Self> {
        let mut app = Self {
            store,
            remote: settings.remote.clone(),
            fetcher: HttpFetcher::default(),
            config: ConfigSession::new("", NoRender).with_debounce(settings.save_debounce()),
            keywords: KeywordSession::new("", NoRender).with_debounce(settings.save_debounce()),
            tab: Tab::Config,
            config_list_state: ListState::default(),
            keyword_list_state: ListState::default(),
            status: String::new(),
        };
        app.reload()?;
        Ok(app)
    }

    fn reload(&mut self) -> Result<()> {
        let now = Instant::now();
        let mut loaded = Vec::new();
        let mut problem = None;
        if let Some(text) = self.store.load(BufferKind::Config)? {
            let report = self.config.on_external_load(&text, LoadSource::Storage, now);
            problem = report
                .error
                .map(|e| format!("config.yaml does not parse: {e}"));
            loaded.push(BufferKind::Config.file_name());
        }
        if let Some(text) = self.store.load(BufferKind::Keywords)? {
            self.keywords
                .on_external_load(&text, LoadSource::Storage, now);
            loaded.push(BufferKind::Keywords.file_name());
        }
        self.status = match problem {
            Some(problem) => problem,
            None if loaded.is_empty() => {
                format!("Nothing stored in {}", self.store.root().display())
            }
            None => format!("Loaded {}", loaded.join(", ")),
        };
        self.clamp_selection();
        Ok(())
    }

    fn list_len(&mut self) -> usize {
        match self.tab {
            Tab::Config => self.config.view().modules.len(),
            Tab::Keywords => self.keywords.view().groups.len(),
        }
    }

    fn list_state(&mut self) -> &mut ListState {
        match self.tab {
            Tab::Config => &mut self.config_list_state,
            Tab::Keywords => &mut self.keyword_list_state,
        }
    }

    fn clamp_selection(&mut self) {
        let modules = self.config.view().modules.len();
        let groups = self.keywords.view().groups.len();
        clamp(&mut self.config_list_state, modules);
        clamp(&mut self.keyword_list_state, groups);
    }

    fn next_item(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = state.selected().map_or(0, |i| (i + 1) % len);
        state.select(Some(i));
    }

    fn previous_item(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn switch_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Config => Tab::Keywords,
            Tab::Keywords => Tab::Config,
        };
    }

    fn toggle_enabled(&mut self) {
        let Some(index) = self.config_list_state.selected() else {
            return;
        };
        let Some(module) = self.config.view().modules.get(index).cloned() else {
            return;
        };
        match module.enabled {
            Some(enabled) => {
                let edit = ConfigEdit::set(&module.key, "enabled", !enabled);
                self.config.on_user_edit(&edit, Instant::now());
                self.status = format!("{}.enabled = {}", module.key, !enabled);
            }
            None => self.status = format!("{} has no enabled flag", module.key),
        }
    }

    fn remove_group(&mut self) {
        let Some(index) = self.keyword_list_state.selected() else {
            return;
        };
        let patch = self
            .keywords
            .on_user_edit(&KeywordEdit::RemoveGroup(index), Instant::now());
        if !patch.is_noop() {
            self.status = format!("Removed group {}", index + 1);
        }
        self.clamp_selection();
    }

    fn remove_last_alias(&mut self) {
        let Some(index) = self.keyword_list_state.selected() else {
            return;
        };
        let item = match self.keywords.view().groups.get(index).map(|g| &g.kind) {
            Some(GroupKind::SingleAlias(_)) => 0,
            Some(GroupKind::AliasCluster(items)) => items.len() - 1,
            _ => {
                self.status = "Selected group has no alias items".to_string();
                return;
            }
        };
        self.keywords.on_user_edit(
            &KeywordEdit::RemoveAliasItem { index, item },
            Instant::now(),
        );
        self.status = format!("Removed alias item {} of group {}", item + 1, index + 1);
        self.clamp_selection();
    }

    fn save(&mut self) {
        let config = self.config.flush(&self.store);
        let keywords = self.keywords.flush(&self.store);
        self.status = match (config, keywords) {
            (false, false) => "Nothing to save".to_string(),
            (true, false) => "Saved config.yaml".to_string(),
            (false, true) => "Saved frequency_words.txt".to_string(),
            (true, true) => "Saved both buffers".to_string(),
        };
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if self.config.flush_if_due(now, &self.store) {
            log::info!("autosaved config");
        }
        if self.keywords.flush_if_due(now, &self.store) {
            log::info!("autosaved keywords");
        }
    }

    fn fetch_templates(&mut self) {
        let now = Instant::now();
        let mut messages: Vec<String> = Vec::new();
        if let Some(url) = self.remote.config_template_url.clone() {
            match self.config.load_remote(&self.fetcher, &url, now) {
                Ok(report) if report.is_valid() => messages.push("config template loaded".into()),
                Ok(_) => messages.push("config template does not parse".into()),
                Err(e) => messages.push(e.to_string()),
            }
        }
        if let Some(url) = self.remote.keywords_template_url.clone() {
            match self.keywords.load_remote(&self.fetcher, &url, now) {
                Ok(_) => messages.push("keyword template loaded".into()),
                Err(e) => messages.push(e.to_string()),
            }
        }
        self.status = if messages.is_empty() {
            "No template URLs configured".to_string()
        } else {
            messages.join("; ")
        };
        self.clamp_selection();
    }

    fn check_versions(&mut self) {
        let Some(url) = self.remote.version_manifest_url.clone() else {
            self.status = "No version manifest URL configured".to_string();
            return;
        };
        let manifest = match self.fetcher.fetch(&url) {
            Ok(text) => VersionManifest::parse(&text),
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        let config = self.config.text();
        let keywords = self.keywords.text();
        let reports = check_buffers(
            &manifest,
            &[
                (BufferKind::Config.file_name(), config.as_str()),
                (BufferKind::Keywords.file_name(), keywords.as_str()),
            ],
        );
        self.status = reports
            .iter()
            .map(|r| {
                format!(
                    "{}: {} ({} / {})",
                    r.file,
                    r.status,
                    show_version(r.local),
                    show_version(r.remote)
                )
            })
            .collect::<Vec<_>>()
            .join(" | ");
    }

    /// Text of the active buffer and the line range to highlight.
    fn raw_text(&mut self) -> (String, Range<usize>, String) {
        match self.tab {
            Tab::Config => {
                let selected = self.config_list_state.selected();
                let view = self.config.view();
                let lines = selected
                    .and_then(|i| view.modules.get(i))
                    .map_or(0..0, |m| m.lines.clone());
                let title = match &view.error {
                    Some(e) => format!("config.yaml (invalid: {e})"),
                    None => "config.yaml".to_string(),
                };
                (self.config.text(), lines, title)
            }
            Tab::Keywords => {
                let Some(index) = self.keyword_list_state.selected() else {
                    return (self.keywords.text(), 0..0, "frequency_words.txt".into());
                };
                let lines = self
                    .keywords
                    .view()
                    .groups
                    .get(index)
                    .map_or(0..0, |g| g.start_line..g.start_line + g.line_count());
                let title = match self.keywords.group_span(index) {
                    Some(span) => format!("frequency_words.txt (bytes {}..{})", span.start, span.end),
                    None => "frequency_words.txt".to_string(),
                };
                (self.keywords.text(), lines, title)
            }
        }
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

fn show_version(version: Option<Version>) -> String {
    version.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn init_logging(storage_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(storage_path.join(LOG_FILE))?;
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Storage path comes from the CLI args, then the settings file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let mut settings = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    match args.len() {
        1 => {}
        2 => settings.storage_path = PathBuf::from(&args[1]),
        _ => {
            eprintln!("Usage: {} [storage-path]", args[0]);
            process::exit(1);
        }
    }

    if let Err(e) = std::fs::create_dir_all(&settings.storage_path) {
        eprintln!(
            "Error: Storage path '{}' is not usable: {e}",
            settings.storage_path.display()
        );
        process::exit(1);
    }
    init_logging(&settings.storage_path)?;
    log::info!("using storage at {}", settings.storage_path.display());

    let mut app = App::new(StateStore::new(&settings.storage_path), &settings)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(TICK)? {
            app.tick();
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => {
                    app.save();
                    return Ok(());
                }
                KeyCode::Tab => app.switch_tab(),
                KeyCode::Down | KeyCode::Char('j') => app.next_item(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
                KeyCode::Char(' ') if app.tab == Tab::Config => app.toggle_enabled(),
                KeyCode::Char('d') if app.tab == Tab::Keywords => app.remove_group(),
                KeyCode::Char('x') if app.tab == Tab::Keywords => app.remove_last_alias(),
                KeyCode::Char('s') => app.save(),
                KeyCode::Char('r') => {
                    if let Err(e) = app.reload() {
                        app.status = format!("Reload failed: {e}");
                    }
                }
                KeyCode::Char('t') => app.fetch_templates(),
                KeyCode::Char('v') => app.check_versions(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let tabs = Tabs::new(vec!["Config", "Keywords"])
        .block(Block::default().borders(Borders::ALL).title("configsync"))
        .select(match app.tab {
            Tab::Config => 0,
            Tab::Keywords => 1,
        })
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let (items, title): (Vec<ListItem>, &str) = match app.tab {
        Tab::Config => (
            app.config
                .view()
                .modules
                .iter()
                .map(|m| {
                    let flag = match m.enabled {
                        Some(true) => "[x] ",
                        Some(false) => "[ ] ",
                        None => "    ",
                    };
                    ListItem::new(format!("{flag}{}", m.key))
                })
                .collect(),
            "Modules",
        ),
        Tab::Keywords => (
            app.keywords
                .view()
                .groups
                .iter()
                .map(|g| {
                    let kind = match g.kind {
                        GroupKind::Plain { .. } => "plain",
                        GroupKind::GroupAlias { .. } => "named",
                        GroupKind::SingleAlias(_) => "alias",
                        GroupKind::AliasCluster(_) => "cluster",
                    };
                    let related = g
                        .related
                        .map(|r| format!(" ({}/{})", r.index, r.total))
                        .unwrap_or_default();
                    ListItem::new(format!("{kind:<8}{}{related}", g.summary()))
                })
                .collect(),
            "Groups",
        ),
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    let state = app.list_state();
    f.render_stateful_widget(list, columns[0], state);

    let (text, highlight, raw_title) = app.raw_text();
    let raw_lines: Vec<Line> = text
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let style = if highlight.contains(&i) {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::from(Span::styled(line.to_string(), style))
        })
        .collect();
    let scroll = highlight.start.saturating_sub(3) as u16;
    let raw = Paragraph::new(raw_lines)
        .block(Block::default().borders(Borders::ALL).title(raw_title))
        .scroll((scroll, 0));
    f.render_widget(raw, columns[1]);

    let dirty = |dirty: bool| if dirty { "*" } else { "" };
    let help_text = vec![
        Line::from(format!(
            "config{} keywords{} | {}",
            dirty(app.config.buffer().is_dirty()),
            dirty(app.keywords.buffer().is_dirty()),
            app.status
        )),
        Line::from(
            "q: Save+quit | Tab: Switch | space: Toggle | d: Drop group | x: Drop alias | s: Save | r: Reload | t: Templates | v: Versions",
        ),
    ];
    f.render_widget(Paragraph::new(help_text).block(Block::default()), rows[2]);
}
