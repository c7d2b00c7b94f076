//! Modal overlays: confirmation, server creation, category picking, and
//! the filter sheet hosting the price slider.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use gamedeals_core::{
    models::Category,
    search::{CategoryPicker, FilterOptions, PLAYER_CEILING},
    services::is_valid_invite_link,
    slider::{RangeSlider, PRICE_STEP},
};

use crate::app::Theme;

/// What the app should do after a modal handled a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalOutcome {
    /// Keep the modal open.
    Open,
    /// Close without side effects.
    Cancel,
    /// Close and let the app act on the modal's final state.
    Confirm,
}

/// Rect of `width` x `height` centered inside `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Destructive action a confirm modal guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteComment { game_id: u64, comment_id: u64 },
    DeleteServer { server_id: u64 },
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

impl ConfirmModal {
    pub fn new(title: &str, message: &str, action: ConfirmAction) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            action,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => ModalOutcome::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => ModalOutcome::Cancel,
            _ => ModalOutcome::Open,
        }
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let area = centered_rect(46, 7, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from(self.message.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "[y] confirm    [n] cancel",
                Style::default().fg(theme.muted),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title.clone())
            .border_style(Style::default().fg(theme.danger));
        frame.render_widget(
            Paragraph::new(lines).block(block).alignment(Alignment::Center),
            area,
        );
    }
}

/// Invite-link entry for registering a Discord server on a game.
#[derive(Debug, Clone)]
pub struct AddServerModal {
    pub game_id: u64,
    pub input: String,
    pub error: Option<String>,
}

impl AddServerModal {
    pub fn new(game_id: u64) -> Self {
        Self {
            game_id,
            input: String::new(),
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Esc => return ModalOutcome::Cancel,
            KeyCode::Enter => {
                if is_valid_invite_link(self.input.trim()) {
                    return ModalOutcome::Confirm;
                }
                self.error = Some(
                    "Enter a discord.gg or discord.com/invite link".to_string(),
                );
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.error = None;
            }
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.input.push(ch);
                    self.error = None;
                }
            }
            _ => {}
        }
        ModalOutcome::Open
    }

    pub fn invite_url(&self) -> String {
        self.input.trim().to_string()
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let area = centered_rect(60, 8, frame.size());
        frame.render_widget(Clear, area);
        let mut lines = vec![
            Line::from("Paste the server's invite link:"),
            Line::from(Span::styled(
                format!("> {}", self.input),
                Style::default().fg(theme.accent),
            )),
        ];
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(theme.danger),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "[Enter] register    [Esc] cancel",
            Style::default().fg(theme.muted),
        )));
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Register Discord server");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Where the picked categories flow back to on confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerTarget {
    SearchFilters,
    Profile,
}

/// Category multi-select overlay shared by the filter sheet and the
/// profile editor.
pub struct CategoryPickerModal {
    pub target: PickerTarget,
    pub picker: CategoryPicker,
    categories: Vec<Category>,
    cursor: usize,
}

impl CategoryPickerModal {
    pub fn new(target: PickerTarget, selected: Vec<u64>, categories: Vec<Category>) -> Self {
        Self {
            target,
            picker: CategoryPicker::new(selected),
            categories,
            cursor: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Esc => return ModalOutcome::Cancel,
            KeyCode::Enter => return ModalOutcome::Confirm,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < self.categories.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') => {
                if let Some(category) = self.categories.get(self.cursor) {
                    self.picker.toggle(category.id, Instant::now());
                }
            }
            _ => {}
        }
        ModalOutcome::Open
    }

    pub fn render(&mut self, frame: &mut Frame, theme: &Theme) {
        let height = (self.categories.len() as u16 + 5).min(frame.size().height);
        let area = centered_rect(44, height, frame.size());
        frame.render_widget(Clear, area);

        let mut lines: Vec<Line> = self
            .categories
            .iter()
            .enumerate()
            .map(|(idx, category)| {
                let mark = if self.picker.is_selected(category.id) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let text = format!("{mark} {}", category.name);
                if idx == self.cursor {
                    Line::from(Span::styled(
                        format!("▶ {text}"),
                        Style::default()
                            .fg(theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(format!("  {text}"))
                }
            })
            .collect();

        if let Some(notice) = self.picker.notice(Instant::now()) {
            lines.push(Line::from(Span::styled(
                notice.to_string(),
                Style::default().fg(theme.warning),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "[Space] toggle  [Enter] apply  [Esc] cancel",
            Style::default().fg(theme.muted),
        )));

        let block = Block::default().borders(Borders::ALL).title("Categories");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Focusable rows of the filter sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterField {
    Price,
    MinRating,
    PlayersMin,
    PlayersMax,
    SinglePlayer,
    MultiPlayer,
}

const FIELD_ORDER: [FilterField; 6] = [
    FilterField::Price,
    FilterField::MinRating,
    FilterField::PlayersMin,
    FilterField::PlayersMax,
    FilterField::SinglePlayer,
    FilterField::MultiPlayer,
];

/// Filter sheet. The price row hosts the dual-thumb slider; the slider is
/// driven by mouse drags on its track and by arrow keys as a fallback.
pub struct FilterModal {
    draft: FilterOptions,
    slider: RangeSlider,
    focus: usize,
    /// Which thumb the arrow keys move. Toggled with Space.
    keyboard_thumb_upper: bool,
    /// Screen rect of the slider track, captured during render so mouse
    /// columns can be mapped to track pixels.
    track_area: Option<Rect>,
    pub reset_requested: bool,
}

const TRACK_WIDTH: f64 = 40.0;

impl FilterModal {
    pub fn new(current: FilterOptions, price_ceiling: u32) -> Self {
        let mut slider = RangeSlider::new(0, price_ceiling, TRACK_WIDTH);
        slider.set_values(current.price_min, current.price_max);
        Self {
            draft: current,
            slider,
            focus: 0,
            keyboard_thumb_upper: false,
            track_area: None,
            reset_requested: false,
        }
    }

    /// The selection as it stands, with the slider folded back in.
    pub fn draft(&self) -> FilterOptions {
        let mut filters = self.draft.clone();
        filters.price_min = self.slider.lower_value();
        filters.price_max = self.slider.upper_value();
        filters
    }

    fn field(&self) -> FilterField {
        FIELD_ORDER[self.focus]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Esc => return ModalOutcome::Cancel,
            KeyCode::Enter => return ModalOutcome::Confirm,
            KeyCode::Char('x') => {
                self.reset_requested = true;
                return ModalOutcome::Confirm;
            }
            KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => {
                self.focus = (self.focus + 1) % FIELD_ORDER.len();
            }
            KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => {
                self.focus = (self.focus + FIELD_ORDER.len() - 1) % FIELD_ORDER.len();
            }
            KeyCode::Char(' ') => match self.field() {
                FilterField::Price => {
                    self.keyboard_thumb_upper = !self.keyboard_thumb_upper;
                }
                FilterField::SinglePlayer => {
                    self.draft.single_player = !self.draft.single_player;
                }
                FilterField::MultiPlayer => {
                    self.draft.multi_player = !self.draft.multi_player;
                }
                _ => {}
            },
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            _ => {}
        }
        ModalOutcome::Open
    }

    /// Mouse drags on the track drive the slider directly.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(track) = self.track_area else {
            return;
        };
        let on_track = mouse.row == track.y
            && mouse.column >= track.x
            && mouse.column < track.x + track.width;
        let px = f64::from(mouse.column.saturating_sub(track.x));
        match mouse.kind {
            MouseEventKind::Down(_) if on_track => self.slider.pointer_down(px),
            MouseEventKind::Drag(_) => self.slider.pointer_move(px),
            MouseEventKind::Up(_) => self.slider.pointer_up(),
            _ => {}
        }
    }

    fn adjust(&mut self, direction: i32) {
        match self.field() {
            FilterField::Price => {
                let step = PRICE_STEP as i64 * i64::from(direction);
                let lower = self.slider.lower_value() as i64;
                let upper = self.slider.upper_value() as i64;
                if self.keyboard_thumb_upper {
                    self.slider
                        .set_values(lower as u32, (upper + step).clamp(0, u32::MAX as i64) as u32);
                } else {
                    self.slider
                        .set_values((lower + step).clamp(0, u32::MAX as i64) as u32, upper as u32);
                }
            }
            FilterField::MinRating => {
                let current = self.draft.min_rating.unwrap_or(0.0);
                let next = (current + 0.5 * direction as f32).clamp(0.0, 5.0);
                self.draft.min_rating = if next <= 0.0 { None } else { Some(next) };
            }
            FilterField::PlayersMin => {
                let next = self.draft.players_min as i64 + i64::from(direction);
                self.draft.players_min =
                    next.clamp(1, self.draft.players_max as i64) as u32;
            }
            FilterField::PlayersMax => {
                let next = self.draft.players_max as i64 + i64::from(direction);
                self.draft.players_max = next
                    .clamp(self.draft.players_min as i64, i64::from(PLAYER_CEILING))
                    as u32;
            }
            FilterField::SinglePlayer => {
                self.draft.single_player = direction > 0;
            }
            FilterField::MultiPlayer => {
                self.draft.multi_player = direction > 0;
            }
        }
    }

    fn track_line(&self) -> String {
        let width = TRACK_WIDTH as usize;
        let lower = ((self.slider.lower_pct() / 100.0) * (width - 1) as f64).round() as usize;
        let upper = ((self.slider.upper_pct() / 100.0) * (width - 1) as f64).round() as usize;
        (0..width)
            .map(|col| {
                if col == lower || col == upper {
                    '●'
                } else if col > lower && col < upper {
                    '═'
                } else {
                    '─'
                }
            })
            .collect()
    }

    pub fn render(&mut self, frame: &mut Frame, theme: &Theme) {
        let area = centered_rect(52, 14, frame.size());
        frame.render_widget(Clear, area);
        let block = Block::default().borders(Borders::ALL).title("Filters");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // price label
                Constraint::Length(1), // slider track
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1), // blank
                Constraint::Length(1), // hints
            ])
            .split(inner);

        let focus_style = Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD);
        let plain = Style::default().fg(theme.primary_fg);
        let style_for = |field: FilterField, current: FilterField| {
            if field == current {
                focus_style
            } else {
                plain
            }
        };
        let current = self.field();

        let thumb = if self.keyboard_thumb_upper { "max" } else { "min" };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(
                    "Price  {} – {}  (arrows move {thumb} thumb)",
                    self.slider.lower_value(),
                    self.slider.upper_value()
                ),
                style_for(FilterField::Price, current),
            ))),
            rows[0],
        );

        let track = Rect::new(rows[1].x + 2, rows[1].y, TRACK_WIDTH as u16, 1);
        self.track_area = Some(track);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                self.track_line(),
                Style::default().fg(theme.accent_alt),
            ))),
            track,
        );

        let rating = self
            .draft
            .min_rating
            .map(|rating| format!("{rating:.1}+"))
            .unwrap_or_else(|| "any".to_string());
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("Minimum rating  {rating}"),
                style_for(FilterField::MinRating, current),
            ))),
            rows[2],
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("Players from  {}", self.draft.players_min),
                style_for(FilterField::PlayersMin, current),
            ))),
            rows[3],
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("Players up to  {}", self.draft.players_max),
                style_for(FilterField::PlayersMax, current),
            ))),
            rows[4],
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(
                    "[{}] Single player",
                    if self.draft.single_player { "x" } else { " " }
                ),
                style_for(FilterField::SinglePlayer, current),
            ))),
            rows[5],
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(
                    "[{}] Multiplayer",
                    if self.draft.multi_player { "x" } else { " " }
                ),
                style_for(FilterField::MultiPlayer, current),
            ))),
            rows[6],
        );

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "[Enter] apply  [x] reset all  [Esc] cancel",
                Style::default().fg(theme.muted),
            ))),
            rows[8],
        );
    }
}
