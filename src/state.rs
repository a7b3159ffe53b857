#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DockState {
    #[default]
    Hidden,
    Showing,
    Shown,
    Hiding,
}

impl DockState {
    /// A show or hide transition currently owns the docking coordinate.
    pub fn is_in_move(self) -> bool {
        matches!(self, DockState::Showing | DockState::Hiding)
    }

    pub fn is_visible(self) -> bool {
        matches!(self, DockState::Showing | DockState::Shown)
    }

    pub fn label(self) -> &'static str {
        match self {
            DockState::Hidden => "hidden",
            DockState::Showing => "showing",
            DockState::Shown => "shown",
            DockState::Hiding => "hiding",
        }
    }
}
