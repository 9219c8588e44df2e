use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Colors used by the renderer for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub focus: Color,
    pub user: Color,
    pub assistant: Color,
    pub success: Color,
    pub button: Color,
    pub button_text: Color,
    pub disabled: Color,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Icon hinting what the toggle switches to.
    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Dark => "☀",
            Theme::Light => "☾",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: Color::Rgb(17, 24, 39),
                text: Color::White,
                muted: Color::Gray,
                border: Color::DarkGray,
                focus: Color::LightBlue,
                user: Color::LightBlue,
                assistant: Color::LightMagenta,
                success: Color::LightGreen,
                button: Color::Blue,
                button_text: Color::White,
                disabled: Color::DarkGray,
            },
            Theme::Light => Palette {
                background: Color::Rgb(243, 244, 246),
                text: Color::Black,
                muted: Color::DarkGray,
                border: Color::Gray,
                focus: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
                success: Color::Green,
                button: Color::Blue,
                button_text: Color::White,
                disabled: Color::Gray,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_round_trips() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Theme::from_str(" Light "), Some(Theme::Light));
        assert_eq!(Theme::from_str("DARK"), Some(Theme::Dark));
        assert_eq!(Theme::from_str("solarized"), None);
    }
}
