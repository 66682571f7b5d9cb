use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, FormField, GateView, PasswordForm, RESET_CONFIRMATION};
use crate::site;

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    let view = app.view();
    render_title_bar(frame, view, chunks[0]);

    match view {
        GateView::Loading => render_loading(frame, chunks[1]),
        GateView::PublicSite => render_site(frame, app, chunks[1]),
        GateView::Login => {
            render_site(frame, app, chunks[1]);
            render_login_overlay(frame, app);
        }
        GateView::PasswordSetup => {
            render_setup(frame, &app.setup, app.config.min_password_length)
        }
        GateView::Admin => {
            render_admin(frame, app, chunks[1]);
            if app.changing_password {
                render_change_password(frame, &app.change);
            }
        }
    }

    render_status_bar(frame, app, view, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ConfirmingReset => render_reset_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, view: GateView, area: Rect) {
    let title = format!("  {}", site::SHOP_NAME);
    let mode = match view {
        GateView::Admin => "[admin]",
        GateView::PasswordSetup => "[setup]",
        GateView::Login => "[login]",
        GateView::Loading | GateView::PublicSite => "",
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + mode.len() as u16 + 4)
                as usize,
        )),
        Span::styled(mode, styles::highlight_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let rect = centered_rect_fixed(30, 3, area);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "   Loading...",
        styles::muted_style(),
    )));
    frame.render_widget(paragraph, rect);
}

fn render_site(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6), Constraint::Length(8)])
        .split(area);

    let hero = vec![
        Line::from(Span::styled(site::HEADLINE, styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(site::TAGLINE, styles::list_item_style())),
    ];
    frame.render_widget(Paragraph::new(hero).wrap(Wrap { trim: true }), chunks[0]);

    let items: Vec<ListItem> = site::SERVICES
        .iter()
        .map(|service| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<20}", service.title), styles::highlight_style()),
                Span::styled(service.description, styles::list_item_style()),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Services ")
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .highlight_style(styles::selected_style());
    let mut state = ListState::default().with_selected(Some(app.site_selection));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let mut contact: Vec<Line> = site::CONTACT
        .iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(format!("{:<10}", line.label), styles::muted_style()),
                Span::styled(line.value, styles::list_item_style()),
            ])
        })
        .collect();
    contact.push(Line::from(""));
    for (days, hours) in site::OPENING_HOURS {
        contact.push(Line::from(vec![
            Span::styled(format!("{:<18}", days), styles::muted_style()),
            Span::styled(*hours, styles::list_item_style()),
        ]));
    }
    let block = Block::default()
        .title(" Contact ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(contact).block(block), chunks[2]);
}

fn password_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let masked: String = "*".repeat(value.chars().count().min(16));
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<18}[", label), styles::muted_style()),
        Span::styled(format!("{:<16}{}", masked, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    Line::from(vec![
        Span::raw("              ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn form_lines(form: &PasswordForm, button: &str) -> Vec<Line<'static>> {
    let mut lines = vec![];
    for field in form.fields() {
        match field {
            FormField::Current => lines.push(password_line(
                "Password:",
                &form.current,
                form.focus == FormField::Current,
            )),
            FormField::New => {
                lines.push(password_line(
                    "New password:",
                    &form.new_password,
                    form.focus == FormField::New,
                ));
                let strength = form.strength();
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(21)),
                    Span::styled(strength.label(), styles::strength_style(strength)),
                ]));
            }
            FormField::Confirm => lines.push(password_line(
                "Confirm:",
                &form.confirmation,
                form.focus == FormField::Confirm,
            )),
            FormField::Button => {
                lines.push(Line::from(""));
                lines.push(button_line(button, form.focus == FormField::Button));
            }
        }
    }
    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }
    lines
}

fn render_dialog(frame: &mut Frame, title: &str, lines: Vec<Line<'static>>, width: u16) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(width, height, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled("  Admin access", styles::title_style())),
        Line::from(""),
    ];
    if app.access_state().is_first_time_access {
        lines.push(Line::from(Span::styled(
            "  First access: use the default password",
            styles::muted_style(),
        )));
        lines.push(Line::from(""));
    }
    lines.extend(form_lines(&app.login, "Login"));
    render_dialog(frame, "Login", lines, 56);
}

fn render_setup(frame: &mut Frame, form: &PasswordForm, min_length: usize) {
    let mut lines = vec![
        Line::from(Span::styled("  Initial setup", styles::title_style())),
        Line::from(Span::styled(
            "  Replace the default password before continuing.",
            styles::muted_style(),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(form, "Save password"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        setup_hint(min_length),
        styles::muted_style(),
    )));
    lines.push(Line::from(Span::styled(
        "  [Esc] cancel and sign out",
        styles::muted_style(),
    )));
    render_dialog(frame, "Password setup", lines, 60);
}

fn setup_hint(min_length: usize) -> String {
    format!("  {}+ characters, upper and lower case, a number", min_length)
}

fn render_change_password(frame: &mut Frame, form: &PasswordForm) {
    let mut lines = vec![Line::from("")];
    lines.extend(form_lines(form, "Change"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  [Esc] back", styles::muted_style())));
    render_dialog(frame, "Change password", lines, 60);
}

fn render_admin(frame: &mut Frame, app: &App, area: Rect) {
    let phase = app
        .gate()
        .map(|gate| gate.phase().label())
        .unwrap_or("unavailable");
    let expires = app
        .gate()
        .and_then(|gate| gate.session_expiry())
        .map(|at| at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let remaining = app
        .session_remaining_display()
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Status           ", styles::muted_style()),
            Span::styled(phase, styles::success_style()),
        ]),
        Line::from(vec![
            Span::styled("  Session expires  ", styles::muted_style()),
            Span::styled(expires, styles::list_item_style()),
        ]),
        Line::from(vec![
            Span::styled("  Time remaining   ", styles::muted_style()),
            Span::styled(remaining, styles::list_item_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [c]", styles::help_key_style()),
            Span::styled(" change password   ", styles::list_item_style()),
            Span::styled("[l]", styles::help_key_style()),
            Span::styled(" log out   ", styles::list_item_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" back to site", styles::list_item_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Admin panel ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, view: GateView, area: Rect) {
    let shortcuts = match view {
        GateView::PublicSite => "[a]dmin | [Ctrl+R] reset | [q]uit",
        GateView::Admin => "[c]hange password | [l]ogout | [q]uit",
        GateView::Login | GateView::PasswordSetup => "[Tab] next field | [Esc] cancel",
        GateView::Loading => "",
    };

    let left_text = if let Some(ref err) = app.storage_error {
        format!(" {} ", err)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        String::from(" ")
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let left_style = if app.storage_error.is_some() {
        styles::error_style()
    } else {
        styles::muted_style()
    };
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_reset_overlay(frame: &mut Frame, app: &App) {
    let lines = vec![
        Line::from(Span::styled(
            "  Reset admin access?",
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  This erases the admin password and session.",
            styles::list_item_style(),
        )),
        Line::from(Span::styled(
            "  The default password will be accepted again.",
            styles::list_item_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  Type {} to confirm: [", RESET_CONFIRMATION), styles::muted_style()),
            Span::styled(format!("{:<8}▌", app.reset_input), styles::selected_style()),
            Span::styled("]", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled("  [Esc] cancel", styles::muted_style())),
    ];
    render_dialog(frame, "Reset", lines, 54);
}

fn render_quit_overlay(frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];
    render_dialog(frame, site::SHOP_NAME, lines, 46);
}
