use eqr_core::news::ArticleCard;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use textwrap::wrap;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::controls::{CACHE_TTL_MAX, CACHE_TTL_MIN, MAX_ARTICLES_MAX, MAX_ARTICLES_MIN};
use crate::app::input::TextField;
use crate::app::run::RunPhase;
use crate::app::{App, Focus, Section};
use crate::strings::{self, build_status_line, help_lines_ascii};
use crate::theme::THEME;

const SIDEBAR_WIDTH: u16 = 40;
const MAX_CARDS: usize = 30;
const CARD_DESCRIPTION_LINES: usize = 3;

pub fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[0]);
    draw_sidebar(f, cols[0], app);
    draw_main(f, cols[1], app);
    draw_status(f, rows[1], app);
    if app.show_help {
        draw_help(f, f.area());
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .title(Span::styled(
            strings::TITLE_CONTROLS,
            Style::default().fg(THEME.heading).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border_inactive));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let c = &app.controls;
    draw_field(f, chunks[0], strings::TITLE_QUERY, &c.query, None, app.focus == Focus::Query);
    draw_slider(
        f,
        chunks[1],
        strings::TITLE_MAX_ARTICLES,
        (c.max_articles, MAX_ARTICLES_MIN, MAX_ARTICLES_MAX),
        app.focus == Focus::MaxArticles,
    );
    draw_field(
        f,
        chunks[2],
        strings::TITLE_DATE_FROM,
        &c.date_from,
        Some(strings::DATE_HINT),
        app.focus == Focus::DateFrom,
    );
    draw_field(
        f,
        chunks[3],
        strings::TITLE_DATE_TO,
        &c.date_to,
        Some(strings::DATE_HINT),
        app.focus == Focus::DateTo,
    );
    draw_slider(
        f,
        chunks[4],
        strings::TITLE_CACHE_TTL,
        (c.cache_ttl_minutes, CACHE_TTL_MIN, CACHE_TTL_MAX),
        app.focus == Focus::CacheTtl,
    );
    draw_button(f, chunks[5], strings::BUTTON_RUN, app.focus == Focus::RunButton);
    draw_button(f, chunks[7], strings::BUTTON_CLEAR, app.focus == Focus::ClearButton);

    let muted = Style::default().fg(THEME.muted);
    let notes = vec![
        Line::from(""),
        Line::from(Span::styled(strings::TIP_MAX_ARTICLES, muted)),
        Line::from(""),
        Line::from(Span::styled(strings::CAPTION_APIS, muted)),
    ];
    f.render_widget(Paragraph::new(notes).wrap(Wrap { trim: true }), chunks[8]);
}

fn draw_field(
    f: &mut Frame,
    area: Rect,
    title: &str,
    field: &TextField,
    placeholder: Option<&str>,
    focused: bool,
) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let inner_w = area.width.saturating_sub(2) as usize;
    let graphemes: Vec<&str> = field.text().graphemes(true).collect();
    let upto = field.cursor.min(graphemes.len());

    // Scroll horizontally so the cursor stays inside the box.
    let mut start = 0usize;
    while start < upto && graphemes[start..upto].concat().width() >= inner_w.max(1) {
        start += 1;
    }
    let line = if graphemes.is_empty() {
        Line::from(Span::styled(
            placeholder.unwrap_or(""),
            Style::default().fg(THEME.muted),
        ))
    } else {
        Line::from(graphemes[start..].concat())
    };
    f.render_widget(Paragraph::new(line).block(block), area);

    if focused {
        let col = graphemes[start..upto].concat().width() as u16;
        f.set_cursor_position(Position::new(area.x + 1 + col, area.y + 1));
    }
}

fn draw_slider(f: &mut Frame, area: Rect, title: &str, range: (u32, u32, u32), focused: bool) {
    let (value, min, max) = range;
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let label = format!(" {}", value);
    let bar_w = (area.width as usize)
        .saturating_sub(2 + 2 + label.len())
        .max(2);
    let bar_style = if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::raw("["),
        Span::styled(strings::slider_bar(value, min, max, bar_w), bar_style),
        Span::raw("]"),
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
    ]);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_button(f: &mut Frame, area: Rect, label: &str, focused: bool) {
    let style = if focused {
        Style::default()
            .fg(THEME.button_fg)
            .bg(THEME.button_focus_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(THEME.border_focus)
            .add_modifier(Modifier::BOLD)
    };
    let text = format!("[ {} ]", label);
    f.render_widget(Paragraph::new(Span::styled(text, style)), area);
}

fn draw_main(f: &mut Frame, area: Rect, app: &mut App) {
    let recent_rows = app.history.recent().len().max(1) as u16;
    let header_h = (recent_rows + 2).max(4);
    let mut constraints = vec![Constraint::Length(header_h), Constraint::Min(3)];
    if app.show_dev_tools {
        constraints.push(Constraint::Length(if app.debug { 18 } else { 8 }));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(3, 4), Constraint::Ratio(1, 4)])
        .split(chunks[0]);
    draw_header(f, header[0]);
    draw_recent(f, header[1], app);
    draw_results(f, chunks[1], app);
    if app.show_dev_tools {
        draw_dev_tools(f, chunks[2], app);
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            strings::APP_TITLE,
            Style::default().fg(THEME.heading).add_modifier(Modifier::BOLD),
        )),
        Line::from(strings::APP_INTRO),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn draw_recent(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus == Focus::History;
    let block = Block::default()
        .title(strings::TITLE_RECENT)
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let inner = block.inner(area);
    app.history_area = Some(inner);
    let entries = app.history.recent();
    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled(
            strings::NO_HISTORY,
            Style::default().fg(THEME.muted),
        ))]
    } else {
        entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let style = if focused && i == app.history_selected {
                    Style::default()
                        .fg(THEME.button_fg)
                        .bg(THEME.button_focus_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(THEME.link)
                };
                Line::from(Span::styled(strings::history_item(&e.query), style))
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_results(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(strings::TITLE_RESULTS)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.results_border));
    let inner = block.inner(area);
    app.results_area = Some(area);
    app.results_viewport = inner.height;

    let lines = results_lines(app, inner.width);
    let total = lines.len();
    let max_scroll = total.saturating_sub(inner.height as usize) as u16;
    app.results_scroll = app.results_scroll.min(max_scroll);

    let para = Paragraph::new(lines)
        .block(block)
        .scroll((app.results_scroll, 0));
    f.render_widget(para, area);

    if total > inner.height as usize {
        let mut sb_state = ScrollbarState::new(max_scroll as usize).position(app.results_scroll as usize);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

/// Pre-wrapped results text, so scrolling works in rendered rows.
fn results_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let width = width.saturating_sub(1).max(10) as usize;
    let heading = Style::default().fg(THEME.heading).add_modifier(Modifier::BOLD);
    let mut out: Vec<Line<'static>> = Vec::new();

    for section in &app.sections {
        match section {
            Section::Notice(n) => {
                let style = Style::default().fg(THEME.notice(n.level));
                for l in wrap(&n.text, width) {
                    out.push(Line::from(Span::styled(l.into_owned(), style)));
                }
                out.push(Line::from(""));
            }
            Section::Articles { query, articles } => {
                out.push(Line::from(Span::styled(strings::HEADING_ARTICLES, heading)));
                out.push(Line::from(Span::styled(
                    strings::found_articles(articles.len(), query),
                    Style::default().fg(THEME.success),
                )));
                out.push(Line::from(""));
                let cards: Vec<ArticleCard> = articles
                    .iter()
                    .take(MAX_CARDS)
                    .map(ArticleCard::from_article)
                    .collect();
                let col_w = width.saturating_sub(3) / 2;
                for pair in cards.chunks(2) {
                    let left = card_lines(&pair[0], col_w);
                    let right = pair.get(1).map(|c| card_lines(c, col_w)).unwrap_or_default();
                    let rows = left.len().max(right.len());
                    for i in 0..rows {
                        let mut spans = Vec::new();
                        let used = match left.get(i) {
                            Some(span) => {
                                let w = span.content.width();
                                spans.push(span.clone());
                                w
                            }
                            None => 0,
                        };
                        if let Some(span) = right.get(i) {
                            spans.push(Span::raw(" ".repeat(col_w.saturating_sub(used) + 3)));
                            spans.push(span.clone());
                        }
                        out.push(Line::from(spans));
                    }
                    out.push(Line::from(""));
                }
            }
            Section::Summary(text) => {
                out.push(Line::from(Span::styled(strings::HEADING_SUMMARY, heading)));
                for para in text.lines() {
                    if para.trim().is_empty() {
                        out.push(Line::from(""));
                        continue;
                    }
                    for l in wrap(para, width) {
                        out.push(Line::from(l.into_owned()));
                    }
                }
                out.push(Line::from(""));
                out.push(Line::from(Span::styled(
                    strings::DOWNLOAD_HINT,
                    Style::default().fg(THEME.muted),
                )));
                out.push(Line::from(""));
            }
        }
    }

    let label = match app.phase {
        RunPhase::Fetching => Some(strings::SPINNER_FETCHING),
        RunPhase::Summarizing => Some(strings::SPINNER_SUMMARIZING),
        RunPhase::Idle => None,
    };
    if let (true, Some(label)) = (app.is_running(), label) {
        out.push(Line::from(Span::styled(
            format!("{} {}", strings::spinner(app.tick), label),
            Style::default().fg(THEME.info),
        )));
        out.push(Line::from(""));
    }

    out.push(Line::from(Span::styled(
        strings::SEPARATOR,
        Style::default().fg(THEME.muted),
    )));
    for l in wrap(strings::FOOTER_NOTES, width) {
        out.push(Line::from(Span::styled(
            l.into_owned(),
            Style::default().fg(THEME.muted),
        )));
    }
    out
}

fn card_lines(card: &ArticleCard, width: usize) -> Vec<Span<'static>> {
    let width = width.max(8);
    let mut out = Vec::new();
    let title_style = Style::default().fg(THEME.link).add_modifier(Modifier::BOLD);
    for l in wrap(&card.title, width).into_iter().take(2) {
        out.push(Span::styled(l.into_owned(), title_style));
    }
    out.push(Span::styled(
        truncate_to_width(&card.byline(), width),
        Style::default().fg(THEME.muted),
    ));
    if !card.description.is_empty() {
        for l in wrap(&card.description, width)
            .into_iter()
            .take(CARD_DESCRIPTION_LINES)
        {
            out.push(Span::raw(l.into_owned()));
        }
    }
    if let Some(url) = &card.url {
        out.push(Span::styled(
            truncate_to_width(url, width),
            Style::default().fg(THEME.link).add_modifier(Modifier::UNDERLINED),
        ));
    }
    out
}

fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for g in s.graphemes(true) {
        let w = g.width();
        if used + w + 1 > width {
            break;
        }
        out.push_str(g);
        used += w;
    }
    out.push('…');
    out
}

fn draw_dev_tools(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(Span::styled(
            strings::TITLE_DEV_TOOLS,
            Style::default().fg(THEME.heading).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::DevTools));
    let muted = Style::default().fg(THEME.muted);
    let mut lines = vec![
        Line::from(strings::DEV_TOOLS_INTRO),
        Line::from(strings::cache_sizes(app.ui_cache.len(), app.module_cache_len())),
        Line::from(Span::styled(strings::DEV_TOOLS_CLEAR_HINT, muted)),
        Line::from(Span::styled(strings::DEV_TOOLS_MODULE_NOTE, muted)),
    ];
    if app.debug {
        lines.push(Line::from(""));
        match serde_json::to_string_pretty(&app.snapshot()) {
            Ok(json) => lines.extend(json.lines().map(|l| Line::from(l.to_string()))),
            Err(e) => lines.push(Line::from(Span::styled(
                format!("session dump failed: {}", e),
                Style::default().fg(THEME.error),
            ))),
        }
    }
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let phase = match app.phase {
        RunPhase::Idle => "Idle",
        RunPhase::Fetching => "Fetching",
        RunPhase::Summarizing => "Summarizing",
    };
    let backend = app.backend.as_ref().map(|b| b.label());
    let tips = build_status_line(
        phase,
        app.focus.label(),
        app.history.len(),
        app.ui_cache.len(),
        backend.as_deref(),
        area.width.saturating_sub(2),
    );
    let para = Paragraph::new(Line::from(Span::styled(tips, Style::default().fg(THEME.muted))))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            strings::TITLE_HELP,
            Style::default().fg(THEME.heading).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}
