use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;
use tracing::info;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use keyseq::logging::{init_tracing, LogRingBuffer};
use keyseq::ui::KeyPressIndicator;
use keyseq::{
    format_key_for_display, Config, KeyDisposition, KeyPress, KeyTarget, MatcherHandle,
    RegisterOptions,
};

/// Which pane currently receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Editor,
    Surface,
}

/// State mutated by binding callbacks; the loop applies it between events
#[derive(Default)]
struct DemoSignals {
    quit: bool,
    show_help: bool,
    clear_editor: bool,
    events: Vec<String>,
}

impl DemoSignals {
    fn push_event(&mut self, line: String) {
        if self.events.len() >= 12 {
            self.events.remove(0);
        }
        self.events.push(line);
    }
}

struct DemoApp {
    matcher: MatcherHandle,
    signals: Rc<RefCell<DemoSignals>>,
    editor: Input,
    focus: Focus,
    key_indicator: KeyPressIndicator,
    log_buffer: LogRingBuffer,
    config: Config,
}

impl DemoApp {
    fn new(config: Config, log_buffer: LogRingBuffer) -> Result<Self> {
        let matcher = MatcherHandle::new(config.matcher.clone());
        let signals = Rc::new(RefCell::new(DemoSignals::default()));
        register_demo_bindings(&matcher, &signals)?;

        let mut key_indicator = KeyPressIndicator::new();
        key_indicator.set_enabled(config.display.show_key_indicator);

        Ok(Self {
            matcher,
            signals,
            editor: Input::default(),
            focus: Focus::Surface,
            key_indicator,
            log_buffer,
            config,
        })
    }

    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
        }

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_app(&mut terminal);

        // Always restore terminal, even on error
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        res
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| self.ui(f))?;

        loop {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    self.key_indicator.record_key(format_key_for_display(&key));

                    let target = match self.focus {
                        Focus::Editor => KeyTarget::TextInput,
                        Focus::Surface => KeyTarget::Surface,
                    };
                    let press = KeyPress::with_target(key, target);

                    match self.matcher.process_key(&press) {
                        KeyDisposition::Suppressed { fired } => {
                            info!(target: "demo", "fired: {}", fired.join(", "));
                        }
                        KeyDisposition::Blocked => {}
                        KeyDisposition::PassThrough => self.handle_passthrough(key),
                    }
                }
            }

            self.matcher.poll_idle();
            self.apply_signals();
            terminal.draw(|f| self.ui(f))?;

            if self.signals.borrow().quit {
                return Ok(());
            }
        }
    }

    /// Keys the engine let through: host-level navigation and typing
    fn handle_passthrough(&mut self, key: crossterm::event::KeyEvent) {
        match key.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Editor => Focus::Surface,
                    Focus::Surface => Focus::Editor,
                };
            }
            KeyCode::Esc => {
                if self.focus == Focus::Surface {
                    self.signals.borrow_mut().quit = true;
                }
            }
            _ => {
                if self.focus == Focus::Editor {
                    self.editor.handle_event(&Event::Key(key));
                }
            }
        }
    }

    fn apply_signals(&mut self) {
        let mut signals = self.signals.borrow_mut();
        if signals.clear_editor {
            signals.clear_editor = false;
            self.editor = Input::default();
        }
    }

    fn ui(&mut self, frame: &mut Frame) {
        let show_log = self.config.display.show_engine_log;
        let constraints = if show_log {
            vec![
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(6),
                Constraint::Length(1),
            ]
        } else {
            vec![
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(1),
            ]
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_editor(frame, chunks[1]);
        self.render_body(frame, chunks[2]);
        if show_log {
            self.render_log(frame, chunks[3]);
        }
        self.key_indicator.render(frame, chunks[chunks.len() - 1]);

        if self.signals.borrow().show_help {
            self.render_help_overlay(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "keyseq demo",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from("Tab: switch focus  |  Ctrl+Shift+H: help  |  q q (on surface): quit"),
        ]);
        frame.render_widget(header, area);
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Editor;
        let title = if focused {
            "Editor [focused: unvalidated bindings stay quiet here]"
        } else {
            "Editor"
        };
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let editor = Paragraph::new(self.editor.value())
            .block(Block::default().borders(Borders::ALL).title(title).style(style));
        frame.render_widget(editor, area);

        if focused {
            let x = area.x + 1 + self.editor.visual_cursor() as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let bindings: Vec<ListItem> = self.matcher.with(|m| {
            m.bindings()
                .map(|binding| {
                    let mut line = format!("{} → {}", binding.pattern, binding.identity);
                    if binding.once {
                        line.push_str(" (once)");
                    }
                    ListItem::new(line)
                })
                .collect()
        });
        let bindings_list = List::new(bindings)
            .block(Block::default().borders(Borders::ALL).title("Bindings"));
        frame.render_widget(bindings_list, halves[0]);

        let mut lines: Vec<Line> = Vec::new();
        let (pending, blocking) = self
            .matcher
            .with(|m| (m.pending_tokens().join(" → "), m.is_blocking()));
        let status = if blocking {
            Span::styled("blocking", Style::default().fg(Color::Red))
        } else if pending.is_empty() {
            Span::styled("idle", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(
                format!("pending: {}", pending),
                Style::default().fg(Color::Yellow),
            )
        };
        lines.push(Line::from(status));
        lines.push(Line::from(""));
        for entry in self.signals.borrow().events.iter().rev() {
            lines.push(Line::from(entry.clone()));
        }
        let activity = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Activity"));
        frame.render_widget(activity, halves[1]);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .log_buffer
            .get_recent(area.height.saturating_sub(2) as usize)
            .into_iter()
            .map(|entry| Line::from(entry.format_for_display()))
            .collect();
        let log = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Engine log"));
        frame.render_widget(log, area);
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(60, 40, frame.area());
        let help = Paragraph::new(vec![
            Line::from("Registered sequences:"),
            Line::from(""),
            Line::from("  ctrl+shift+h   toggle this help (surface only)"),
            Line::from("  q q            quit (surface only)"),
            Line::from("  ctrl+l         clear the editor (fires anywhere)"),
            Line::from("  ctrl+o         one-shot greeting, gone after one use"),
            Line::from(""),
            Line::from("Focus the editor with Tab and note how the surface-only"),
            Line::from("sequences stop firing while you type."),
        ])
        .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(Clear, area);
        frame.render_widget(help, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn register_demo_bindings(
    matcher: &MatcherHandle,
    signals: &Rc<RefCell<DemoSignals>>,
) -> Result<()> {
    let help = signals.clone();
    matcher.register(
        RegisterOptions::new()
            .identity("help")
            .pattern("ctrl+shift+h")
            .callback(move |_, _| {
                let mut signals = help.borrow_mut();
                signals.show_help = !signals.show_help;
            }),
    )?;

    let quit = signals.clone();
    matcher.register(
        RegisterOptions::new()
            .identity("quit")
            .pattern("q+q")
            .callback(move |identity, _| {
                let mut signals = quit.borrow_mut();
                signals.push_event(format!("{} requested", identity));
                signals.quit = true;
            }),
    )?;

    // Validator opts this binding in everywhere, including the editor
    let clear = signals.clone();
    matcher.register(
        RegisterOptions::new()
            .identity("clear-editor")
            .pattern("ctrl+l")
            .target_validator(|_| true)
            .callback(move |_, _| {
                let mut signals = clear.borrow_mut();
                signals.clear_editor = true;
                signals.push_event("editor cleared".to_string());
            }),
    )?;

    let greet = signals.clone();
    matcher.register(
        RegisterOptions::new()
            .identity("one-shot")
            .pattern("ctrl+o")
            .once(true)
            .callback(move |_, _| {
                greet
                    .borrow_mut()
                    .push_event("one-shot fired (now unregistered)".to_string());
            }),
    )?;

    Ok(())
}

fn main() -> Result<()> {
    let log_buffer = init_tracing();
    let config = Config::load().unwrap_or_default();

    info!(target: "system", "starting keyseq demo");
    DemoApp::new(config, log_buffer)?.run()
}
