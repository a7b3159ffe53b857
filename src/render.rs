//! Terminal rendering of an [`ItemStrip`] dock and the playground footer.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Widget};

use crate::content::ItemStrip;
use crate::dock::DockCore;
use crate::theme;
use crate::ui::{SignedRect, UiFrame, safe_set_string};

/// Draws the dock at its live stage rectangle. Nothing is drawn while the
/// content is invisible.
pub fn render_dock(frame: &mut UiFrame<'_>, core: &DockCore<ItemStrip>) {
    if !core.is_content_visible() {
        return;
    }
    let dest = SignedRect::from_geometry(&core.stage());
    if dest.width == 0 || dest.height == 0 {
        return;
    }
    let local = dest.local();
    let mut offscreen = Buffer::empty(local);
    draw_strip(&mut offscreen, local, core.view(), core.is_pinned());
    frame.blit_from_signed(&offscreen, dest);
}

fn draw_strip(buffer: &mut Buffer, area: Rect, strip: &ItemStrip, pinned: bool) {
    let border = if pinned {
        theme::dock_border_pinned()
    } else {
        theme::dock_border()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme::dock_bg()).fg(theme::dock_fg()))
        .render(area, buffer);

    let item_style = Style::default().bg(theme::item_bg()).fg(theme::item_fg());
    for (rect, item) in strip.item_rects() {
        let cell = SignedRect::from_geometry(&rect);
        let (Ok(x), Ok(y)) = (u16::try_from(cell.x), u16::try_from(cell.y)) else {
            continue;
        };
        let label_y = y.saturating_add(cell.height / 2);
        let label = if strip.runs_horizontally() {
            format!(" {} ", item.name)
        } else {
            // vertical items show their first letters stacked
            item.name.chars().take(cell.height as usize).collect()
        };
        if strip.runs_horizontally() {
            safe_set_string(buffer, area, x, label_y, &label, item_style);
        } else {
            for (offset, ch) in label.chars().enumerate() {
                let row = y.saturating_add(1).saturating_add(offset as u16);
                safe_set_string(buffer, area, x.saturating_add(cell.width / 2), row, &ch.to_string(), item_style);
            }
        }
    }
}

/// Highlights the touch strip so it can be found with the mouse.
pub fn render_touch_strip(frame: &mut UiFrame<'_>, touch: &crate::geometry::Rect) {
    let cells = SignedRect::from_geometry(touch);
    let area = frame.area();
    let style = Style::default().fg(theme::touch_strip());
    let buffer = frame.buffer_mut();
    for dy in 0..cells.height.max(1) as i32 {
        for dx in 0..cells.width.max(1) as i32 {
            let (x, y) = (cells.x + dx, cells.y + dy);
            let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
                continue;
            };
            safe_set_string(buffer, area, x, y, "·", style);
        }
    }
}

/// Status line on top, most recent log lines below it.
pub fn render_footer(frame: &mut UiFrame<'_>, area: Rect, status: &str, lines: &[String]) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let background = Style::default().bg(theme::footer_bg()).fg(theme::footer_fg());
    frame.render_widget(Block::default().style(background), area);
    let buffer = frame.buffer_mut();
    safe_set_string(
        buffer,
        area,
        area.x,
        area.y,
        status,
        background.fg(theme::status_fg()),
    );
    let rows = area.height.saturating_sub(1) as usize;
    let skip = lines.len().saturating_sub(rows);
    for (row, line) in lines.iter().skip(skip).enumerate() {
        safe_set_string(buffer, area, area.x, area.y + 1 + row as u16, line, background);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_shows_status_and_latest_lines() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buffer = Buffer::empty(area);
        let mut frame = UiFrame::from_parts(area, &mut buffer);
        let lines = vec!["old".to_string(), "mid".to_string(), "new".to_string()];
        render_footer(&mut frame, area, "shown", &lines);
        assert_eq!(buffer.cell((0, 0)).unwrap().symbol(), "s");
        assert_eq!(buffer.cell((0, 1)).unwrap().symbol(), "m");
        assert_eq!(buffer.cell((0, 2)).unwrap().symbol(), "n");
    }

    #[test]
    fn strip_labels_land_inside_their_items() {
        let strip = ItemStrip::new(vec![crate::content::Item::new("ab")]);
        let area = Rect::new(0, 0, 6, 3);
        let mut buffer = Buffer::empty(area);
        draw_strip(&mut buffer, area, &strip, false);
        assert_eq!(buffer.cell((2, 1)).unwrap().symbol(), "a");
        assert_eq!(buffer.cell((3, 1)).unwrap().symbol(), "b");
    }
}
