use ratatui::style::Color;

use crate::app::NoticeLevel;

pub struct Theme {
    pub border_focus: Color,
    pub border_inactive: Color,
    pub results_border: Color,
    pub heading: Color,
    pub button_fg: Color,
    pub button_focus_bg: Color,
    pub link: Color,
    pub muted: Color,
    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Cyan,
    border_inactive: Color::DarkGray,
    results_border: Color::DarkGray,
    heading: Color::Yellow,
    button_fg: Color::Black,
    button_focus_bg: Color::Cyan,
    link: Color::Blue,
    muted: Color::DarkGray,
    info: Color::LightBlue,
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::Red,
};

impl Theme {
    pub fn notice(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => self.info,
            NoticeLevel::Success => self.success,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.error,
        }
    }
}
