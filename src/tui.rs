use crate::app::{App, Dispatch, Focus, ThreadDispatcher};
use crate::format::LogLine;
use crate::i18n::I18n;
use crate::runner::RunnerEvent;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::Once;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

const TICK: Duration = Duration::from_millis(100);
const PAGE: usize = 10;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Raw mode (and optionally the alternate screen) for as long as it lives.
struct TerminalGuard {
    alt_screen: bool,
}

impl TerminalGuard {
    fn enter(alt_screen: bool) -> Result<Self> {
        terminal::enable_raw_mode().context("enabling raw mode")?;
        if alt_screen {
            execute!(io::stdout(), EnterAlternateScreen).context("entering alternate screen")?;
        }
        Ok(Self { alt_screen })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal(self.alt_screen);
    }
}

fn restore_terminal(alt_screen: bool) {
    let mut stdout = io::stdout();
    if alt_screen {
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
    let _ = execute!(stdout, crossterm::cursor::Show);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Run the interactive UI until the user quits.
pub fn run(mut app: App, i18n: &I18n, alt_screen: bool) -> Result<()> {
    static INIT_CTRL_C: Once = Once::new();
    INIT_CTRL_C.call_once(|| {
        let _ = ctrlc::set_handler(move || {
            restore_terminal(alt_screen);
            std::process::exit(130);
        });
    });

    let _guard = TerminalGuard::enter(alt_screen)?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("creating terminal")?;
    terminal.clear()?;

    let (tx, rx) = mpsc::channel();
    let mut dispatcher = ThreadDispatcher::new(tx);
    event_loop(&mut terminal, &mut app, &mut dispatcher, &rx, i18n)
}

fn event_loop<D: Dispatch>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    dispatcher: &mut D,
    rx: &Receiver<RunnerEvent>,
    i18n: &I18n,
) -> Result<()> {
    loop {
        // Workers only hand text over; the log is mutated here, on the UI thread.
        while let Ok(runner_event) = rx.try_recv() {
            app.handle_event(runner_event);
        }

        terminal.draw(|f| draw(f, app, i18n))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key(app, key, dispatcher) == Flow::Quit {
                return Ok(());
            }
        }
    }
}

fn handle_key<D: Dispatch>(app: &mut App, key: KeyEvent, dispatcher: &mut D) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Flow::Quit,
            KeyCode::Char('u') if app.focus() == Focus::Package => {
                app.package_clear();
                Flow::Continue
            }
            _ => Flow::Continue,
        };
    }

    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab => app.set_focus(app.focus().next()),
        KeyCode::F(2) => {
            app.search(dispatcher);
        }
        KeyCode::F(3) => {
            app.install(dispatcher);
        }
        KeyCode::PageUp => app.log_mut().scroll_up(PAGE),
        KeyCode::PageDown => app.log_mut().scroll_down(PAGE),
        KeyCode::End => app.log_mut().scroll_to_bottom(),
        code => match app.focus() {
            Focus::Versions => match code {
                KeyCode::Up => app.select_prev(),
                KeyCode::Down => app.select_next(),
                KeyCode::Enter => {
                    app.search(dispatcher);
                }
                KeyCode::Backspace => app.filter_pop(),
                KeyCode::Delete => app.filter_clear(),
                KeyCode::Char(c) => app.filter_push(c),
                _ => {}
            },
            Focus::Package => match code {
                KeyCode::Enter => {
                    app.search(dispatcher);
                }
                KeyCode::Backspace => app.package_pop(),
                KeyCode::Delete => app.package_clear(),
                KeyCode::Up => app.select_prev(),
                KeyCode::Down => app.select_next(),
                KeyCode::Char(c) => app.package_push(c),
                _ => {}
            },
            Focus::Log => match code {
                KeyCode::Up | KeyCode::Char('k') => app.log_mut().scroll_up(1),
                KeyCode::Down | KeyCode::Char('j') => app.log_mut().scroll_down(1),
                KeyCode::Home | KeyCode::Char('g') => app.log_mut().scroll_up(usize::MAX),
                KeyCode::Char('G') => app.log_mut().scroll_to_bottom(),
                _ => {}
            },
        },
    }
    Flow::Continue
}

fn block<'a>(title: String, focused: bool) -> Block<'a> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw(f: &mut Frame, app: &App, i18n: &I18n) {
    let list_height = (app.versions().len().clamp(1, 8) + 2) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(list_height),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.size());

    draw_versions(f, app, i18n, chunks[0]);
    draw_package(f, app, i18n, chunks[1]);
    draw_buttons(f, i18n, chunks[2]);
    draw_log(f, app, i18n, chunks[3]);

    let hint = Paragraph::new(i18n.t("hint_bar")).style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, chunks[4]);
}

fn draw_versions(f: &mut Frame, app: &App, i18n: &I18n, area: Rect) {
    let title = if app.version_filter().is_empty() {
        i18n.t("title_versions")
    } else {
        i18n.t_format("title_versions_filtered", &[app.version_filter()])
    };
    let block = block(title, app.focus() == Focus::Versions);

    if app.visible_versions().is_empty() {
        let key = if app.versions().is_empty() { "no_versions" } else { "no_matches" };
        let empty = Paragraph::new(i18n.t(key))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .visible_versions()
        .iter()
        .map(|&i| ListItem::new(app.versions()[i].as_str()))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::White).bg(Color::Blue))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.cursor()));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_package(f: &mut Frame, app: &App, i18n: &I18n, area: Rect) {
    let focused = app.focus() == Focus::Package;
    let text = if app.package().is_empty() {
        Line::from(Span::styled(
            i18n.t("package_placeholder"),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(app.package())
    };
    f.render_widget(
        Paragraph::new(text).block(block(i18n.t("title_package"), focused)),
        area,
    );
    if focused {
        let x = area.x + 1 + app.package().width() as u16;
        f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

fn draw_buttons(f: &mut Frame, i18n: &I18n, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    for (rect, key, label) in [(halves[0], "F2", "btn_search"), (halves[1], "F3", "btn_install")] {
        let button = Paragraph::new(Line::from(vec![
            Span::styled(format!("[{}] ", key), Style::default().fg(Color::Yellow)),
            Span::raw(i18n.t(label)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, rect);
    }
}

fn draw_log(f: &mut Frame, app: &App, i18n: &I18n, area: Rect) {
    let log = app.log();
    let mut title = i18n.t("title_log");
    if !log.is_following() {
        title = format!("{} ({})", title, i18n.t("log_scrolled"));
    }
    let lines = render_log_lines(log.lines(), &i18n.t("running"), &i18n.t("error_marker"));
    let height = area.height.saturating_sub(2) as usize;
    let top = log.top_row(height).min(u16::MAX as usize) as u16;
    let paragraph = Paragraph::new(lines)
        .block(block(title, app.focus() == Focus::Log))
        .scroll((top, 0));
    f.render_widget(paragraph, area);
}

/// One `Line` per terminal row, matching `LogView::row_count`.
fn render_log_lines<'a>(entries: &'a [LogLine], running: &str, error: &str) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for entry in entries {
        match entry {
            LogLine::Running(cmd) => lines.push(Line::from(Span::styled(
                format!("{} {}", running, cmd),
                Style::default().fg(Color::DarkGray),
            ))),
            LogLine::KeyValue { key, value } => lines.push(Line::from(vec![
                Span::styled(format!("{}:", key), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(value.as_str()),
            ])),
            LogLine::Plain(text) => lines.push(Line::from(text.as_str())),
            LogLine::Error(text) => {
                let red = Style::default().fg(Color::Red);
                let trimmed = text.trim_end();
                if trimmed.is_empty() {
                    lines.push(Line::from(Span::styled(error.to_string(), red.add_modifier(Modifier::BOLD))));
                    continue;
                }
                for (i, row) in trimmed.lines().enumerate() {
                    let lead = if i == 0 {
                        Span::styled(format!("{} ", error), red.add_modifier(Modifier::BOLD))
                    } else {
                        Span::raw(" ".repeat(error.width() + 1))
                    };
                    lines.push(Line::from(vec![lead, Span::styled(row, red)]));
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandChain;
    use crate::log_view::LogView;
    use crate::pyenv::Pyenv;
    use crate::runner::JobId;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<(JobId, CommandChain)>,
    }

    impl Dispatch for Recorder {
        fn dispatch(&mut self, job: JobId, chain: CommandChain) {
            self.sent.push((job, chain));
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Pyenv::new("pyenv"), "pvm", vec!["3.11.4".into(), "3.10.9".into()])
    }

    #[test]
    fn typing_and_enter_search() {
        let mut app = app();
        let mut rec = Recorder::default();
        for c in "requests".chars() {
            assert_eq!(handle_key(&mut app, press(KeyCode::Char(c)), &mut rec), Flow::Continue);
        }
        handle_key(&mut app, press(KeyCode::Down), &mut rec);
        handle_key(&mut app, press(KeyCode::Enter), &mut rec);
        assert_eq!(rec.sent.len(), 1);
        assert!(rec.sent[0].1.to_string().contains("PYENV_VERSION=3.10.9"));
        assert!(rec.sent[0].1.to_string().ends_with("pip show requests"));
    }

    #[test]
    fn f3_installs_and_escape_quits() {
        let mut app = app();
        let mut rec = Recorder::default();
        handle_key(&mut app, press(KeyCode::F(3)), &mut rec);
        assert!(rec.sent.is_empty());
        app.package_push('x');
        handle_key(&mut app, press(KeyCode::F(3)), &mut rec);
        assert_eq!(rec.sent.len(), 1);
        assert_eq!(rec.sent[0].1.steps().len(), 2);
        assert_eq!(handle_key(&mut app, press(KeyCode::Esc), &mut rec), Flow::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, ctrl_c, &mut rec), Flow::Quit);
    }

    #[test]
    fn version_focus_filters_instead_of_typing_package() {
        let mut app = app();
        let mut rec = Recorder::default();
        handle_key(&mut app, press(KeyCode::Tab), &mut rec);
        handle_key(&mut app, press(KeyCode::Tab), &mut rec);
        assert_eq!(app.focus(), Focus::Versions);
        for c in "3.10".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)), &mut rec);
        }
        assert_eq!(app.package(), "");
        assert_eq!(app.selected_version(), Some("3.10.9"));
    }

    #[test]
    fn rendered_rows_match_row_count() {
        let mut log = LogView::new();
        log.push(LogLine::Running("pyenv versions".into()));
        log.push(LogLine::KeyValue { key: "Name".into(), value: "requests".into() });
        log.push(LogLine::Error("line one\nline two\n".into()));
        log.push(LogLine::Error("\n".into()));
        let lines = render_log_lines(log.lines(), "Running:", "Error:");
        assert_eq!(lines.len(), log.row_count());
        let first_error: String = lines[2].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first_error, "Error: line one");
    }
}
