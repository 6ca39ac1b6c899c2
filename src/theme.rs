use ratatui::style::Color;

/// Colors used by the terminal front end
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Text color used for the engine's default (black) style
    pub foreground: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Color of the modified marker in the status bar
    pub modified_color: Color,

    /// Background color for selected text
    pub selection_bg: Color,

    /// Foreground color for inline boxes
    pub inline_box_fg: Color,

    /// Background color for inline boxes
    pub inline_box_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            modified_color: Color::LightRed,
            selection_bg: Color::LightBlue,
            inline_box_fg: Color::Black,
            inline_box_bg: Color::Gray,
        }
    }
}
