use ratatui::style::Color;

// Centralized playground colors.

pub fn dock_bg() -> Color {
    Color::DarkGray
}
pub fn dock_fg() -> Color {
    Color::White
}
pub fn dock_border() -> Color {
    Color::Gray
}
pub fn dock_border_pinned() -> Color {
    Color::Rgb(255, 165, 0)
}

// Items
pub fn item_bg() -> Color {
    Color::Blue
}
pub fn item_fg() -> Color {
    Color::White
}

// Touch strip / footer
pub fn touch_strip() -> Color {
    Color::Green
}
pub fn footer_bg() -> Color {
    Color::Black
}
pub fn footer_fg() -> Color {
    Color::Gray
}
pub fn status_fg() -> Color {
    Color::Yellow
}
