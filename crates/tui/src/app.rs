use std::{cmp, io, thread, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gasolinera_core::{
    AppConfig, FuelType, RandomSelector, Sale, SaleRequest, StateEntry, StateStore, Station,
    StationTemplate,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table,
        TableState, Wrap,
    },
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 64;
const MAX_RECENT_SALES: usize = 8;
const MENU_ITEMS: [&str; 5] = [
    "Use station",
    "New station",
    "Load station",
    "Save station",
    "Quit",
];

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Setup,
    Station,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    FuelType,
    Attendant,
    PumpCount,
    SellVolume,
    SellPrice,
    SaveName,
}

impl PromptKind {
    fn title(self) -> &'static str {
        match self {
            PromptKind::FuelType => "New fuel type (name:price:available)",
            PromptKind::Attendant => "New attendant",
            PromptKind::PumpCount => "Number of pumps",
            PromptKind::SellVolume => "Volume to sell",
            PromptKind::SellPrice => "Amount the customer pays",
            PromptKind::SaveName => "Save station as",
        }
    }
}

#[derive(Debug, Clone)]
struct InputPrompt {
    kind: PromptKind,
    input: String,
    cursor: usize,
}

impl InputPrompt {
    fn new(kind: PromptKind, default: &str) -> Self {
        Self {
            kind,
            input: default.to_string(),
            cursor: default.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_INPUT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn value(&self) -> &str {
        self.input.trim()
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal console over a single station.
pub struct GasolineraApp {
    config: AppConfig,
    store: StateStore,
    station: Option<Station>,
    draft: StationTemplate,
    saves: Vec<StateEntry>,
    recent_sales: Vec<String>,
    screen: Screen,
    prompt: Option<InputPrompt>,
    pending_overwrite: Option<String>,
    state: UiState,
    theme: Theme,
}

impl GasolineraApp {
    pub fn new(config: AppConfig) -> Self {
        let store = config.state_store();
        let draft = config.template.clone();
        Self {
            config,
            store,
            station: None,
            draft,
            saves: Vec::new(),
            recent_sales: Vec::new(),
            screen: Screen::Menu,
            prompt: None,
            pending_overwrite: None,
            state: UiState::default(),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "State files live in {}",
            self.store.root().display()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        error!(?err, "Command failed");
                        self.state.set_status(format!("Error: {err:#}"));
                    }
                }
                Some(AppEvent::Tick) => {}
                None => break,
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Setup => self.handle_setup_key(key),
            Screen::Station => self.handle_station_key(key),
            Screen::Load => self.handle_load_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    if self.station.is_some() {
                        self.screen = Screen::Station;
                    } else {
                        self.state
                            .set_status("There is no station to use yet".to_string());
                    }
                }
                1 => {
                    self.draft = self.config.template.clone();
                    self.screen = Screen::Setup;
                    self.state
                        .set_status("Configure the new station, Enter to create".to_string());
                }
                2 => {
                    self.refresh_saves()?;
                    self.state.load_cursor = 0;
                    self.screen = Screen::Load;
                    if self.saves.is_empty() {
                        self.state.set_status("No saved stations found".to_string());
                    } else {
                        self.state.set_status("Select a station to load".to_string());
                    }
                }
                3 => self.prompt_save(),
                4 => self.state.should_quit = true,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('f') => self.prompt = Some(InputPrompt::new(PromptKind::FuelType, "")),
            KeyCode::Char('a') => self.prompt = Some(InputPrompt::new(PromptKind::Attendant, "")),
            KeyCode::Char('p') => {
                let current = self.draft.pumps.to_string();
                self.prompt = Some(InputPrompt::new(PromptKind::PumpCount, &current));
            }
            KeyCode::Char('+') => self.draft.pumps += 1,
            KeyCode::Char('-') => self.draft.pumps = cmp::max(1, self.draft.pumps.saturating_sub(1)),
            KeyCode::Char('c') => {
                self.draft.fuel_types.clear();
                self.draft.attendants.clear();
                self.state.set_status("Draft cleared".to_string());
            }
            KeyCode::Enter => self.create_station()?,
            _ => {}
        }
        Ok(())
    }

    fn create_station(&mut self) -> Result<()> {
        let mut problems = Vec::new();
        if self.draft.attendants.is_empty() {
            problems.push("a station cannot be created without attendants");
        }
        if self.draft.fuel_types.is_empty() {
            problems.push("a station cannot be created without fuel types");
        }
        if !problems.is_empty() {
            self.state.set_status(problems.join("; "));
            return Ok(());
        }

        let station = self.draft.build(&mut RandomSelector::new())?;
        info!(pumps = station.pump_count(), "New station created from console");
        self.install_station(station);
        self.state.set_status("Station created".to_string());
        Ok(())
    }

    fn handle_station_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(station) = self.station.as_ref() else {
            self.screen = Screen::Menu;
            return Ok(());
        };
        let pumps = station.pump_count();
        let fuels = station.fuel_types().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Menu,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.pump_cursor = step(self.state.pump_cursor, 1, pumps)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.pump_cursor = step(self.state.pump_cursor, -1, pumps)
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                self.state.fuel_cursor = step(self.state.fuel_cursor, 1, fuels)
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.state.fuel_cursor = step(self.state.fuel_cursor, -1, fuels)
            }
            KeyCode::Char('v') => self.prompt = Some(InputPrompt::new(PromptKind::SellVolume, "")),
            KeyCode::Char('p') => self.prompt = Some(InputPrompt::new(PromptKind::SellPrice, "")),
            KeyCode::Char('s') => self.prompt_save(),
            _ => {}
        }
        Ok(())
    }

    fn handle_load_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Menu,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.load_cursor = step(self.state.load_cursor, 1, self.saves.len())
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.load_cursor = step(self.state.load_cursor, -1, self.saves.len())
            }
            KeyCode::Char('r') => self.refresh_saves()?,
            KeyCode::Enter => {
                let Some(entry) = self.saves.get(self.state.load_cursor).cloned() else {
                    return Ok(());
                };
                let station = self
                    .store
                    .load(&entry)
                    .with_context(|| format!("could not load {}", entry.name))?;
                self.install_station(station);
                self.state
                    .set_status(format!("Loaded station from {}", entry.path.display()));
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.pending_overwrite = None;
                self.state.set_status("Cancelled".to_string());
            }
            KeyCode::Enter => {
                let kind = prompt.kind;
                let value = prompt.value().to_string();
                if self.submit_prompt(kind, &value)? {
                    self.prompt = None;
                }
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => prompt.insert(ch),
            _ => {}
        }
        Ok(())
    }

    /// Apply a confirmed prompt. Returns `false` to keep the prompt open.
    fn submit_prompt(&mut self, kind: PromptKind, value: &str) -> Result<bool> {
        match kind {
            PromptKind::FuelType => match parse_fuel_type(value, &self.draft.fuel_types) {
                Ok(fuel) => {
                    self.state
                        .set_status(format!("Added fuel type {}", fuel.name()));
                    self.draft.fuel_types.push(fuel);
                }
                Err(reason) => {
                    self.state.set_status(reason);
                    return Ok(false);
                }
            },
            PromptKind::Attendant => match parse_attendant(value, &self.draft.attendants) {
                Ok(name) => {
                    self.state.set_status(format!("Added attendant {name}"));
                    self.draft.attendants.push(name);
                }
                Err(reason) => {
                    self.state.set_status(reason);
                    return Ok(false);
                }
            },
            PromptKind::PumpCount => match value.parse::<usize>() {
                Ok(count) if count >= 1 => self.draft.pumps = count,
                _ => {
                    self.state
                        .set_status("The number of pumps must be at least 1".to_string());
                    return Ok(false);
                }
            },
            PromptKind::SellVolume => match parse_volume(value) {
                Ok(volume) => self.sell(SaleRequest::ByVolume(volume))?,
                Err(reason) => {
                    self.state.set_status(reason);
                    return Ok(false);
                }
            },
            PromptKind::SellPrice => match parse_price(value) {
                Ok(price) => self.sell(SaleRequest::ByPrice(price))?,
                Err(reason) => {
                    self.state.set_status(reason);
                    return Ok(false);
                }
            },
            PromptKind::SaveName => return self.save_station(value),
        }
        Ok(true)
    }

    fn sell(&mut self, request: SaleRequest) -> Result<()> {
        let station = self
            .station
            .as_mut()
            .ok_or_else(|| anyhow!("no station loaded"))?;
        let fuel = station
            .fuel_types()
            .iter()
            .nth(self.state.fuel_cursor)
            .map(|fuel| fuel.name().to_string())
            .ok_or_else(|| anyhow!("no fuel type selected"))?;
        let sale = station.sell(&fuel, request, self.state.pump_cursor)?;

        let message = describe_sale(&sale, request);
        let stamp = Local::now().format("%H:%M:%S");
        self.recent_sales.insert(0, format!("{stamp}  {message}"));
        self.recent_sales.truncate(MAX_RECENT_SALES);
        self.state.set_status(message);
        Ok(())
    }

    fn prompt_save(&mut self) {
        if self.station.is_none() {
            self.state
                .set_status("There is no station to save".to_string());
            return;
        }
        self.pending_overwrite = None;
        self.prompt = Some(InputPrompt::new(PromptKind::SaveName, "gasolinera"));
    }

    fn save_station(&mut self, name: &str) -> Result<bool> {
        let Some(station) = self.station.as_ref() else {
            return Ok(true);
        };
        if name.is_empty() {
            self.state.set_status("Enter a file name".to_string());
            return Ok(false);
        }
        if self.store.exists(name) && self.pending_overwrite.as_deref() != Some(name) {
            self.pending_overwrite = Some(name.to_string());
            self.state.set_status(format!(
                "{} already exists, press Enter again to replace it",
                self.store.path_for(name).display()
            ));
            return Ok(false);
        }
        self.pending_overwrite = None;
        let entry = self.store.save(name, station)?;
        self.state
            .set_status(format!("Station saved to {}", entry.path.display()));
        Ok(true)
    }

    fn install_station(&mut self, station: Station) {
        self.station = Some(station);
        self.recent_sales.clear();
        self.state.pump_cursor = 0;
        self.state.fuel_cursor = 0;
        self.screen = Screen::Station;
    }

    fn refresh_saves(&mut self) -> Result<()> {
        self.saves = self.store.entries()?;
        self.state.load_cursor = cmp::min(
            self.state.load_cursor,
            self.saves.len().saturating_sub(1),
        );
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Setup => self.draw_setup(frame),
            Screen::Station => self.draw_station(frame),
            Screen::Load => self.draw_load(frame),
        }
        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(4),
            ])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            "G A S O L I N E R A",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, layout[0]);

        let items: Vec<ListItem> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let marker = if idx == self.state.menu_cursor {
                    Span::styled("▶ ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("  ")
                };
                ListItem::new(Line::from(vec![marker, Span::raw(*label)]))
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(self.state.menu_cursor));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Main menu"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, layout[1], &mut list_state);

        self.render_status(frame, layout[2]);
    }

    fn draw_setup(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(4),
            ])
            .split(area);

        let summary = Paragraph::new(format!(
            "Pumps: {}    Fuel types: {}    Attendants: {}",
            self.draft.pumps,
            self.draft.fuel_types.len(),
            self.draft.attendants.len()
        ))
        .block(Block::default().borders(Borders::ALL).title("New station"));
        frame.render_widget(summary, layout[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);

        let fuel_rows = self.draft.fuel_types.iter().map(|fuel| {
            Row::new(vec![
                Cell::from(fuel.name().to_string()),
                Cell::from(fuel.unit_price().to_string()),
                Cell::from(format!("{:.2}", fuel.available())),
            ])
        });
        let fuel_table = Table::new(
            fuel_rows,
            [
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ],
        )
        .header(header_row(&["Fuel", "Price", "Available"], &self.theme))
        .block(Block::default().borders(Borders::ALL).title("Fuel types"));
        frame.render_widget(fuel_table, columns[0]);

        let staff: Vec<ListItem> = self
            .draft
            .attendants
            .iter()
            .map(|name| ListItem::new(name.as_str()))
            .collect();
        let staff_list =
            List::new(staff).block(Block::default().borders(Borders::ALL).title("Attendants"));
        frame.render_widget(staff_list, columns[1]);

        self.render_help(
            frame,
            layout[2],
            "f fuel type · a attendant · p/+/- pumps · c clear · Enter create · Esc back",
        );
        self.render_status(frame, layout[3]);
    }

    fn draw_station(&self, frame: &mut Frame) {
        let Some(station) = self.station.as_ref() else {
            return;
        };
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(MAX_RECENT_SALES as u16 + 2),
                Constraint::Length(3),
                Constraint::Length(4),
            ])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(layout[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);

        self.render_pumps(frame, columns[0], station);
        self.render_inventory(frame, right[0], station);
        self.render_attendants(frame, right[1], station);

        let sales: Vec<ListItem> = if self.recent_sales.is_empty() {
            vec![ListItem::new(Span::styled(
                "No sales yet",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            self.recent_sales
                .iter()
                .map(|line| ListItem::new(line.as_str()))
                .collect()
        };
        let sales_list =
            List::new(sales).block(Block::default().borders(Borders::ALL).title("Recent sales"));
        frame.render_widget(sales_list, layout[1]);

        self.render_help(
            frame,
            layout[2],
            "j/k pump · h/l fuel · v sell volume · p sell amount · s save · Esc menu",
        );
        self.render_status(frame, layout[3]);
    }

    fn render_pumps(&self, frame: &mut Frame, area: Rect, station: &Station) {
        let fuels: Vec<&FuelType> = station.fuel_types().iter().collect();
        let mut header = vec!["#", "Attendant"];
        header.extend(fuels.iter().map(|fuel| fuel.name()));

        let rows = (0..station.pump_count()).map(|index| {
            let attendant = station
                .assigned_attendant(index)
                .map(|a| a.name().to_string())
                .unwrap_or_default();
            let mut cells = vec![Cell::from(index.to_string()), Cell::from(attendant)];
            cells.extend(fuels.iter().map(|fuel| {
                let sold = station.dispensed(index, fuel.name()).unwrap_or_default();
                Cell::from(format!("{sold:.2}"))
            }));
            Row::new(cells)
        });

        let mut widths = vec![Constraint::Length(3), Constraint::Length(12)];
        widths.extend(fuels.iter().map(|_| Constraint::Min(8)));

        let table = Table::new(rows, widths)
            .header(header_row(&header, &self.theme))
            .block(Block::default().borders(Borders::ALL).title("Pumps"))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut table_state = TableState::default();
        table_state.select(Some(self.state.pump_cursor));
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_inventory(&self, frame: &mut Frame, area: Rect, station: &Station) {
        let rows = station.fuel_types().iter().map(|fuel| {
            let left = fuel.available();
            let stock_style = if left <= 0.0 {
                Style::default().fg(self.theme.warning)
            } else {
                Style::default()
            };
            let total = station.total_dispensed(fuel.name()).unwrap_or_default();
            Row::new(vec![
                Cell::from(fuel.name().to_string()),
                Cell::from(fuel.unit_price().to_string()),
                Cell::from(format!("{left:.2}")).style(stock_style),
                Cell::from(format!("{total:.2}")),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ],
        )
        .header(header_row(&["Fuel", "Price", "Available", "Sold"], &self.theme))
        .block(Block::default().borders(Borders::ALL).title("Inventory"))
        .highlight_style(Style::default().bg(self.theme.selection_bg))
        .highlight_symbol("▶ ");
        let mut table_state = TableState::default();
        table_state.select(Some(self.state.fuel_cursor));
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_attendants(&self, frame: &mut Frame, area: Rect, station: &Station) {
        let rows = station.attendants().iter().map(|attendant| {
            Row::new(vec![
                Cell::from(attendant.name().to_string()),
                Cell::from(attendant.earnings().to_string())
                    .style(Style::default().fg(self.theme.success)),
            ])
        });
        let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
            .header(header_row(&["Attendant", "Earnings"], &self.theme))
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Attendants · total {}",
                station.total_earnings()
            )));
        frame.render_widget(table, area);
    }

    fn draw_load(&self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3), Constraint::Length(4)])
            .split(area);

        let total = self.saves.len();
        let mut list_state = ListState::default();
        let items: Vec<ListItem> = if total == 0 {
            vec![ListItem::new(Line::from("  No saved stations found"))]
        } else {
            list_state.select(Some(self.state.load_cursor.min(total - 1)));
            self.saves
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let marker = if idx == self.state.load_cursor {
                        Span::styled("▶ ", Style::default().fg(self.theme.accent))
                    } else {
                        Span::raw("  ")
                    };
                    let timestamp = entry.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
                    ListItem::new(Line::from(vec![
                        marker,
                        Span::raw(format!("{}  [{}]", entry.name, timestamp)),
                    ]))
                })
                .collect()
        };

        let block = Block::default().borders(Borders::ALL).title(format!(
            "Load station · {}",
            self.store.root().display()
        ));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        self.render_help(frame, chunks[1], "j/k select · Enter load · r refresh · Esc back");
        self.render_status(frame, chunks[2]);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &InputPrompt) {
        let area = centered_rect(60, 7, frame.size());
        frame.render_widget(Clear, area);

        let (before, after) = prompt.input.split_at(prompt.cursor.min(prompt.input.len()));
        let input_line = Line::from(vec![
            Span::raw(before.to_string()),
            Span::styled("▏", Style::default().fg(self.theme.accent)),
            Span::raw(after.to_string()),
        ]);
        let hint = Line::from(Span::styled(
            "Enter confirm · Esc cancel",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![Line::from(""), input_line, Line::from(""), hint])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(prompt.kind.title())
                    .border_style(Style::default().fg(self.theme.accent)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect, text: &str) {
        let paragraph = Paragraph::new(Span::styled(
            text.to_string(),
            Style::default().fg(self.theme.muted),
        ))
        .block(Block::default().borders(Borders::ALL).title("Keys"));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let secondary = match &self.station {
            Some(station) => format!(
                "Station: {} pumps, {} fuel types, {} attendants",
                station.pump_count(),
                station.fuel_types().len(),
                station.attendants().len()
            ),
            None => "No station loaded".to_string(),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn header_row<'a>(labels: &[&'a str], theme: &Theme) -> Row<'a> {
    Row::new(labels.iter().map(|label| Cell::from(*label))).style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// Move a cursor by `delta`, wrapping around `len` entries.
fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).rem_euclid(len as isize) as usize
}

fn describe_sale(sale: &Sale, request: SaleRequest) -> String {
    let place = format!("pump {} ({})", sale.pump, sale.attendant);
    match request {
        SaleRequest::ByPrice(asked) if sale.price != asked && sale.is_partial() => format!(
            "Not enough {} in stock, so only {} was charged at {place}",
            sale.fuel, sale.price
        ),
        SaleRequest::ByPrice(_) => format!("Sold {} of {} at {place}", sale.price, sale.fuel),
        SaleRequest::ByVolume(_) if sale.is_partial() => format!(
            "Not enough {} in stock: delivered {:.2} of {:.2} for {} at {place}",
            sale.fuel, sale.delivered_volume, sale.requested_volume, sale.price
        ),
        SaleRequest::ByVolume(_) => format!(
            "Sold {:.2} of {} for {} at {place}",
            sale.delivered_volume, sale.fuel, sale.price
        ),
    }
}

fn parse_fuel_type(input: &str, existing: &[FuelType]) -> Result<FuelType, String> {
    let parts: Vec<&str> = input.split(':').map(str::trim).collect();
    let [name, price, available] = parts[..] else {
        return Err("Use the form name:price:available".to_string());
    };
    if name.is_empty() {
        return Err("The fuel type needs a name".to_string());
    }
    if existing.iter().any(|fuel| fuel.name() == name) {
        return Err(format!("There is already a fuel type called {name}"));
    }
    let price = match price.parse::<u64>() {
        Ok(price) if price > 0 => price,
        _ => return Err("The price must be a whole number above 0".to_string()),
    };
    let available = match available.parse::<f64>() {
        Ok(volume) if volume.is_finite() && volume >= 0.0 => volume,
        _ => return Err("The available volume must be a number of at least 0".to_string()),
    };
    Ok(FuelType::new(name, price, available))
}

fn parse_attendant(input: &str, existing: &[String]) -> Result<String, String> {
    let name = input.trim();
    if name.is_empty() {
        return Err("The attendant needs a name".to_string());
    }
    if name.contains(':') {
        return Err("Attendant names cannot contain ':'".to_string());
    }
    if existing.iter().any(|known| known == name) {
        return Err(format!("{name} is already on the staff"));
    }
    Ok(name.to_string())
}

fn parse_volume(input: &str) -> Result<f64, String> {
    match input.parse::<f64>() {
        Ok(volume) if volume.is_finite() && volume > 0.0 => Ok(volume),
        _ => Err("The volume must be a number above 0".to_string()),
    }
}

fn parse_price(input: &str) -> Result<u64, String> {
    match input.parse::<u64>() {
        Ok(price) if price > 0 => Ok(price),
        _ => Err("The amount must be a whole number above 0".to_string()),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    pump_cursor: usize,
    fuel_cursor: usize,
    load_cursor: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            pump_cursor: 0,
            fuel_cursor: 0,
            load_cursor: 0,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        self.menu_cursor = step(self.menu_cursor, delta, MENU_ITEMS.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fuel_type_form() {
        let fuel = parse_fuel_type("corriente:14500:100", &[]).expect("valid");
        assert_eq!(fuel.name(), "corriente");
        assert_eq!(fuel.unit_price(), 14500);
        assert_eq!(fuel.available(), 100.0);

        let existing = vec![fuel];
        assert!(parse_fuel_type("corriente:1:1", &existing).is_err());
        assert!(parse_fuel_type("plus:0:1", &existing).is_err());
        assert!(parse_fuel_type("plus:10:-1", &existing).is_err());
        assert!(parse_fuel_type("plus:10", &existing).is_err());
        assert!(parse_fuel_type(" :10:1", &existing).is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert_eq!(parse_volume("2.5"), Ok(2.5));
        assert!(parse_volume("0").is_err());
        assert!(parse_volume("-1").is_err());
        assert!(parse_volume("inf").is_err());
        assert_eq!(parse_price("30000"), Ok(30_000));
        assert!(parse_price("0").is_err());
        assert!(parse_price("12.5").is_err());
    }

    #[test]
    fn attendant_names_are_unique_and_clean() {
        let staff = vec!["Alice".to_string()];
        assert_eq!(parse_attendant(" Bob ", &staff), Ok("Bob".to_string()));
        assert!(parse_attendant("Alice", &staff).is_err());
        assert!(parse_attendant("Bo:b", &staff).is_err());
        assert!(parse_attendant("   ", &staff).is_err());
    }

    #[test]
    fn cursor_steps_wrap() {
        assert_eq!(step(0, -1, 3), 2);
        assert_eq!(step(2, 1, 3), 0);
        assert_eq!(step(5, 1, 0), 0);
    }

    #[test]
    fn prompt_edits_at_cursor() {
        let mut prompt = InputPrompt::new(PromptKind::SaveName, "gas");
        prompt.move_cursor(-1);
        prompt.insert('X');
        assert_eq!(prompt.input, "gaXs");
        prompt.backspace();
        prompt.delete();
        assert_eq!(prompt.input, "ga");
        prompt.move_cursor(10);
        assert_eq!(prompt.cursor, 2);
    }

    #[test]
    fn describes_partial_price_sale() {
        let sale = Sale {
            pump: 1,
            fuel: "extra".to_string(),
            attendant: "Bob".to_string(),
            requested_volume: 60.0,
            delivered_volume: 50.0,
            price: 1_054_500,
        };
        let message = describe_sale(&sale, SaleRequest::ByPrice(1_265_400));
        assert!(message.starts_with("Not enough extra"));
        assert!(message.contains("1054500"));
    }
}
