use std::{
    cell::RefCell,
    env,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton as TermButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use styledit::config::Config;
use styledit::editor::{self as edit, EMBED_MARKER, Key, Modifiers, MouseButton, StyleEdit};
use styledit::render::{CellMetrics, TerminalSurface};
use styledit::theme::Theme;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const WHEEL_STEP: i32 = 3;

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let config = Config::from_env();
    if let Some(log_file) = &config.log_file {
        init_tracing(log_file)?;
    }

    let path = env::args().nth(1).map(PathBuf::from);
    let mut app = App::new(&config, path)?;

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

/// Sends tracing output to `path`; the terminal belongs to the editor.
fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("styledit=debug")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
        }

        if last_tick.elapsed() >= tick_rate {
            app.prune_status_message();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    editor: StyleEdit,
    surface: Rc<RefCell<TerminalSurface>>,
    theme: Theme,
    file_path: Option<PathBuf>,
    text_area: Rect,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
    last_click: Option<(Instant, u16, u16)>,
    click_count: u32,
}

impl App {
    fn new(config: &Config, file_path: Option<PathBuf>) -> Result<Self> {
        let theme = Theme::default();
        let surface = Rc::new(RefCell::new(TerminalSurface::new(0, 0, theme.clone())));
        let mut editor = StyleEdit::with_options(CellMetrics::terminal(), config.options.clone());
        editor.set_listener(Box::new(surface.clone()));
        config.apply(&mut editor);

        let status = match &file_path {
            Some(path) if path.exists() => {
                editor
                    .load(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                None
            }
            Some(_) => Some("New document".to_string()),
            None => Some("Scratch buffer, Ctrl-S is disabled".to_string()),
        };
        editor.focus(true);

        Ok(Self {
            editor,
            surface,
            theme,
            file_path,
            text_area: Rect::default(),
            should_quit: false,
            dirty: false,
            status_message: status.map(|msg| (msg, Instant::now())),
            last_click: None,
            click_count: 0,
        })
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 1 } else { 0 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let text_area = vertical[0];
        let status_area = vertical[1];
        self.resize(text_area);

        self.surface.borrow_mut().begin_frame();
        self.editor.paint(edit::Rect::new(
            0,
            0,
            i32::from(text_area.width),
            i32::from(text_area.height),
        ));
        {
            let mut surface = self.surface.borrow_mut();
            surface.blit(frame.buffer_mut(), text_area);
            if let Some(caret) = surface.caret_position() {
                frame.set_cursor_position(Position::new(text_area.x + caret.x, text_area.y + caret.y));
            }
            if surface.take_changed() && !self.editor.options().read_only {
                self.dirty = true;
            }
            for id in surface.take_clicks() {
                self.status_message = Some((format!("Clicked element {id}"), Instant::now()));
            }
        }

        if status_height > 0 {
            let status = Paragraph::new(self.status_line()).style(
                Style::default()
                    .fg(self.theme.status_bar_fg)
                    .bg(self.theme.status_bar_bg),
            );
            frame.render_widget(status, status_area);
        }
    }

    fn resize(&mut self, text_area: Rect) {
        if text_area == self.text_area {
            return;
        }
        self.text_area = text_area;
        self.surface
            .borrow_mut()
            .resize(text_area.width, text_area.height);
        self.editor
            .set_layout_size(i32::from(text_area.width), i32::from(text_area.height));
        self.editor.scroll_if_needed(true, true);
    }

    fn status_line(&mut self) -> Line<'static> {
        self.prune_status_message();
        let name = self
            .file_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "[scratch]".to_string());
        let caret = self.editor.caret();
        let line = self
            .editor
            .blocks()
            .position(|(id, _)| id == caret.block())
            .unwrap_or(0);
        let position = format!(" [{},{}] ", line + 1, caret.ofs() + 1);

        let mut spans = vec![
            Span::raw(position),
            Span::styled(
                name,
                Style::default()
                    .fg(self.theme.filename_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if self.dirty {
            spans.push(Span::styled("*", Style::default().fg(self.theme.modified_color)));
        }
        let tail = match &self.status_message {
            Some((message, _)) => format!(" | {message}"),
            None => format!(
                " | Blocks: {} | Ctrl-S save | Ctrl-Q quit",
                self.editor.block_count()
            ),
        };
        spans.push(Span::raw(tail));
        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Ok(())
            }
            Event::FocusGained => {
                self.editor.focus(true);
                Ok(())
            }
            Event::FocusLost => {
                self.editor.focus(false);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('s') if ctrl => return self.save(),
            _ => {}
        }
        let Some(key) = map_key(code) else {
            return Ok(());
        };
        let mut mods = map_modifiers(modifiers);
        if code == KeyCode::BackTab {
            mods.shift = true;
        }
        self.editor.key_down(key, mods);
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let area = self.text_area;
        let point = edit::Point::new(
            i32::from(mouse.column) - i32::from(area.x),
            i32::from(mouse.row) - i32::from(area.y),
        );
        let modifiers = map_modifiers(mouse.modifiers);
        match mouse.kind {
            MouseEventKind::Down(button) => {
                let clicks = self.count_click(mouse.column, mouse.row);
                self.editor
                    .mouse_down(point, map_button(button), clicks, modifiers);
            }
            MouseEventKind::Up(button) => {
                self.editor.mouse_up(point, map_button(button), modifiers);
            }
            MouseEventKind::Drag(_) => self.editor.mouse_move(point),
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_STEP),
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_STEP),
            _ => {}
        }
    }

    /// Terminals do not report double clicks; a second press on the same
    /// cell shortly after the first one counts as one.
    fn count_click(&mut self, column: u16, row: u16) -> u32 {
        let now = Instant::now();
        self.click_count = match self.last_click {
            Some((at, c, r)) if c == column && r == row && now.duration_since(at) < DOUBLE_CLICK => {
                self.click_count + 1
            }
            _ => 1,
        };
        self.last_click = Some((now, column, row));
        self.click_count
    }

    fn scroll_by(&mut self, dy: i32) {
        let pos = self.editor.scroll_pos();
        self.editor.set_scroll_pos(pos.x, pos.y + dy);
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = &self.file_path else {
            self.status_message = Some(("No file name given".to_string(), Instant::now()));
            return Ok(());
        };
        let contents: Vec<u8> = self
            .editor
            .text()
            .into_iter()
            .filter(|&ch| ch != EMBED_MARKER)
            .collect();
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "saved");

        self.dirty = false;
        self.status_message = Some(("Saved".to_string(), Instant::now()));
        Ok(())
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char(ch) => Key::Char(u8::try_from(u32::from(ch)).ok()?),
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Insert => Key::Insert,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Enter => Key::Enter,
        _ => return None,
    };
    Some(key)
}

fn map_modifiers(modifiers: KeyModifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.contains(KeyModifiers::SHIFT),
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        alt: modifiers.contains(KeyModifiers::ALT),
    }
}

fn map_button(button: TermButton) -> MouseButton {
    match button {
        TermButton::Left => MouseButton::Left,
        TermButton::Right => MouseButton::Right,
        TermButton::Middle => MouseButton::Middle,
    }
}
