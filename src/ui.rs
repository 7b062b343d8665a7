use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lot_manager::{FeeCalculator, Lot, LotStatus, Report, Vehicle};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Spots,
    Vehicles,
    Owners,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Spots => Page::Vehicles,
            Page::Vehicles => Page::Owners,
            Page::Owners => Page::Spots,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Spots => Page::Owners,
            Page::Vehicles => Page::Spots,
            Page::Owners => Page::Vehicles,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Spots => "Spots",
            Page::Vehicles => "Vehicles",
            Page::Owners => "Owners",
        }
    }
}

/// Outcome of the last action, shown in the status bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct App {
    pub lot: Lot,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(lot: Lot) -> Self {
        let mut app = Self {
            lot,
            state: TableState::default(),
            current_page: Page::Spots,
            show_detail: false,
            notice: None,
        };
        app.reset_selection();
        app
    }

    fn row_count(&self) -> usize {
        match self.current_page {
            Page::Spots => self.lot.spots().len(),
            Page::Vehicles => self.lot.vehicles().len(),
            Page::Owners => self.lot.owners().len(),
        }
    }

    fn reset_selection(&mut self) {
        let selected = if self.row_count() == 0 { None } else { Some(0) };
        self.state.select(selected);
    }

    /// Keep the cursor inside the table after rows disappear.
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.reset_selection();
    }

    /// Vehicle under the cursor: the selected row on the vehicles page, the
    /// vehicle in the selected spot on the spots page.
    pub fn selected_vehicle(&self) -> Option<&Vehicle> {
        let i = self.state.selected()?;
        match self.current_page {
            Page::Vehicles => self.lot.vehicles().get(i),
            Page::Spots => {
                let spot = self.lot.spots().get(i)?;
                if spot.occupied {
                    self.lot.find_vehicle(&spot.vehicle_id)
                } else {
                    None
                }
            }
            Page::Owners => {
                let owner = self.lot.owners().get(i)?;
                self.lot.find_vehicle(&owner.vehicle_id)
            }
        }
    }

    fn selected_vehicle_id(&self) -> Option<String> {
        self.selected_vehicle().map(|v| v.id.clone())
    }

    pub fn park_selected(&mut self) {
        let Some(id) = self.selected_vehicle_id() else {
            self.notice = Some(Notice::Error("No vehicle selected".to_string()));
            return;
        };
        self.notice = Some(match self.lot.park(&id) {
            Ok(spot) => Notice::Info(format!("{} parked in spot #{}", id, spot)),
            Err(e) => Notice::Error(e.to_string()),
        });
    }

    pub fn unpark_selected(&mut self) {
        let Some(id) = self.selected_vehicle_id() else {
            self.notice = Some(Notice::Error("No vehicle selected".to_string()));
            return;
        };
        self.notice = Some(match self.lot.unpark(&id) {
            Ok(fee) => Notice::Info(format!(
                "{} left, fee {:.2} {}",
                id,
                fee,
                self.lot.config().currency
            )),
            Err(e) => Notice::Error(e.to_string()),
        });
        self.clamp_selection();
    }

    pub fn write_report(&mut self) {
        let report = Report::generate(&self.lot, Utc::now());
        self.notice = Some(match report.write_to(&self.lot.config().reports_dir()) {
            Ok(path) => Notice::Info(format!("Report saved to {}", path.display())),
            Err(e) => Notice::Error(e.to_string()),
        });
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('p') => app.park_selected(),
                KeyCode::Char('u') => app.unpark_selected(),
                KeyCode::Char('r') => app.write_report(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.reset_selection(),
                KeyCode::End => {
                    let len = app.row_count();
                    if len > 0 {
                        app.state.select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Spots => render_spots(f, area, app),
        Page::Vehicles => render_vehicles(f, area, app),
        Page::Owners => render_owners(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let status = LotStatus::capture(&app.lot, Utc::now());

    let pages = [Page::Spots, Page::Vehicles, Page::Owners];
    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Spots: {}", status.total),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("■ {}", status.occupied),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("□ {}", status.available),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Lot Manager "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn page_table<'a>(rows: Vec<Row<'a>>, widths: &[Constraint], title: &str) -> Table<'a> {
    Table::new(rows, widths.to_vec())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", title)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ")
}

fn render_spots(f: &mut Frame, area: Rect, app: &mut App) {
    let now = Utc::now();
    let rows: Vec<Row> = app
        .lot
        .spots()
        .iter()
        .map(|spot| {
            if !spot.occupied {
                return Row::new(vec![
                    Cell::from(format!("#{}", spot.number)),
                    Cell::from("free").style(Style::default().fg(Color::Green)),
                    Cell::from(""),
                    Cell::from(""),
                    Cell::from(""),
                ]);
            }
            let plate = app
                .lot
                .find_vehicle(&spot.vehicle_id)
                .map(|v| v.license_plate.clone())
                .unwrap_or_default();
            let (hours, fee) = match spot.entry_time {
                Some(entry) => (
                    format!("{:.2}", FeeCalculator::hours_parked(entry, now)),
                    format!("{:.2}", app.lot.fees().compute_fee(entry, now)),
                ),
                None => (String::new(), String::new()),
            };
            Row::new(vec![
                Cell::from(format!("#{}", spot.number)),
                Cell::from("occupied").style(Style::default().fg(Color::Red)),
                Cell::from(spot.vehicle_id.clone()),
                Cell::from(truncate(&plate, 12)),
                Cell::from(format!("{}h  {}", hours, fee)),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(20),
        ],
        "Spots",
    )
    .header(header_row(&["Spot", "State", "Vehicle", "Plate", "Time / Fee"]));

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_vehicles(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .lot
        .vehicles()
        .iter()
        .map(|v| {
            let (state, color) = if v.parked {
                (format!("spot #{}", v.spot_number), Color::Red)
            } else {
                ("not parked".to_string(), Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(v.id.clone()),
                Cell::from(truncate(&v.license_plate, 12)),
                Cell::from(v.vehicle_type.as_str().to_string()),
                Cell::from(truncate(&v.owner_name, 20)),
                Cell::from(state).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(22),
            Constraint::Length(12),
        ],
        "Vehicles",
    )
    .header(header_row(&["Id", "Plate", "Type", "Owner", "State"]));

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_owners(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .lot
        .owners()
        .iter()
        .map(|o| {
            Row::new(vec![
                Cell::from(truncate(&o.id, 12)),
                Cell::from(truncate(&o.name, 20)),
                Cell::from(o.phone.clone()),
                Cell::from(o.vehicle_id.clone()),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(14),
            Constraint::Length(22),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
        "Owners",
    )
    .header(header_row(&["Id", "Name", "Phone", "Vehicle"]));

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.row_count()),
        Style::default().fg(Color::Cyan),
    )];

    match &app.notice {
        Some(Notice::Info(msg)) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Green)));
        }
        Some(Notice::Error(msg)) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Red)));
        }
        None => {}
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Park | "));
    status_spans.push(Span::styled("u", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Unpark | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Report | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn detail_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Vehicle Details ");

    let Some(vehicle) = app.selected_vehicle() else {
        f.render_widget(Paragraph::new("No vehicle selected").block(block), area);
        return;
    };

    let now = Utc::now();
    let mut content = vec![
        Line::from(""),
        detail_line("Id", vehicle.id.clone()),
        detail_line("Plate", vehicle.license_plate.clone()),
        detail_line("Type", vehicle.vehicle_type.as_str().to_string()),
        Line::from(""),
        detail_line("Owner", vehicle.owner_name.clone()),
        detail_line("Phone", vehicle.owner_phone.clone()),
    ];
    if let Some(owner) = app.lot.owner_of(&vehicle.id) {
        content.push(detail_line("Owner Id", owner.id.clone()));
    }

    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  SESSION",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )));
    content.push(Line::from(""));

    match (vehicle.parked, vehicle.entry_time) {
        (true, Some(entry)) => {
            content.push(detail_line("Spot", format!("#{}", vehicle.spot_number)));
            content.push(detail_line(
                "Entered",
                entry.format("%Y-%m-%d %H:%M").to_string(),
            ));
            content.push(detail_line(
                "Parked",
                format!("{:.2}h", FeeCalculator::hours_parked(entry, now)),
            ));
            content.push(detail_line(
                "Fee so far",
                format!(
                    "{:.2} {}",
                    app.lot.fees().compute_fee(entry, now),
                    app.lot.config().currency
                ),
            ));
        }
        _ => content.push(Line::from(Span::styled(
            "  Not parked",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lot_manager::{LotConfig, NewVehicle};
    use tempfile::tempdir;

    fn app_with_vehicles(dir: &std::path::Path, plates: &[&str]) -> App {
        let mut lot = Lot::open(LotConfig::new(dir).with_spots(2)).unwrap();
        for plate in plates {
            lot.register_vehicle(NewVehicle {
                license_plate: plate.to_string(),
                vehicle_type: "Car".to_string(),
                owner_name: "Karim Ali".to_string(),
                owner_phone: "01612345678".to_string(),
            })
            .unwrap();
        }
        App::new(lot)
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Spots.next(), Page::Vehicles);
        assert_eq!(Page::Owners.next(), Page::Spots);
        assert_eq!(Page::Spots.previous(), Page::Owners);
    }

    #[test]
    fn test_park_and_unpark_selected_vehicle() {
        let dir = tempdir().unwrap();
        let mut app = app_with_vehicles(dir.path(), &["DHA-1001", "DHA-1002"]);
        app.next_page();
        assert_eq!(app.current_page, Page::Vehicles);
        app.next();

        app.park_selected();
        assert!(matches!(app.notice, Some(Notice::Info(_))));
        assert_eq!(app.lot.find_vehicle("VH0002").unwrap().spot_number, 1);

        // parking it again is reported, not applied
        app.park_selected();
        assert!(matches!(app.notice, Some(Notice::Error(_))));

        app.unpark_selected();
        assert!(matches!(app.notice, Some(Notice::Info(_))));
        assert!(!app.lot.find_vehicle("VH0002").unwrap().parked);
    }

    #[test]
    fn test_free_spot_has_no_vehicle() {
        let dir = tempdir().unwrap();
        let mut app = app_with_vehicles(dir.path(), &["DHA-1001"]);
        assert_eq!(app.current_page, Page::Spots);
        assert!(app.selected_vehicle().is_none());

        app.unpark_selected();
        assert_eq!(
            app.notice,
            Some(Notice::Error("No vehicle selected".to_string()))
        );
    }

    #[test]
    fn test_navigation_wraps() {
        let dir = tempdir().unwrap();
        let mut app = app_with_vehicles(dir.path(), &[]);
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        app.next_page();
        assert_eq!(app.state.selected(), None);
        app.next();
        assert_eq!(app.state.selected(), None);
    }
}
