//! Navigation heuristics that decide when a retry target has gone stale.
//!
//! Views are compared by kind only. The classifier is coarse
//! and can misfire, e.g. a main menu shown as an overlay while still
//! connected counts as leaving the session.

/// A view (screen) reported by the navigation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Title,
    WorldSelect,
    ServerList,
    Realms,
    Disconnected,
    /// Account re-authentication hand-off, usually entered from `Disconnected`.
    ReAuthentication,
    Connecting,
    LevelLoading,
    InGame,
    /// Any other view, identified by name.
    Other(String),
}

impl View {
    /// Top-level menus from which the user picks a new world or server.
    pub fn is_main_menu(&self) -> bool {
        matches!(
            self,
            View::Title | View::WorldSelect | View::ServerList | View::Realms
        )
    }
}

/// Whether both sides are the same kind of view (or both absent).
pub fn same_kind(from: Option<&View>, to: Option<&View>) -> bool {
    match (from, to) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn is_main_menu(view: Option<&View>) -> bool {
    view.is_some_and(View::is_main_menu)
}

pub fn is_reauthenticating(from: Option<&View>, to: Option<&View>) -> bool {
    matches!(
        (from, to),
        (Some(View::Disconnected), Some(View::ReAuthentication))
    )
}

/// True when the transition means the user abandoned the previous session.
pub fn leaves_session(from: Option<&View>, to: Option<&View>) -> bool {
    if same_kind(from, to) {
        return false;
    }
    (!is_main_menu(from) && is_main_menu(to)) || is_reauthenticating(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind() {
        assert!(same_kind(None, None));
        assert!(same_kind(Some(&View::Title), Some(&View::Title)));
        assert!(!same_kind(Some(&View::Title), None));
        assert!(!same_kind(Some(&View::Title), Some(&View::WorldSelect)));
        assert!(same_kind(
            Some(&View::Other("options".to_string())),
            Some(&View::Other("options".to_string()))
        ));
        assert!(!same_kind(
            Some(&View::Other("options".to_string())),
            Some(&View::Other("controls".to_string()))
        ));
    }

    #[test]
    fn test_entering_main_menu_leaves_session() {
        assert!(leaves_session(Some(&View::Disconnected), Some(&View::Title)));
        assert!(leaves_session(Some(&View::InGame), Some(&View::ServerList)));
        assert!(leaves_session(None, Some(&View::WorldSelect)));
    }

    #[test]
    fn test_moving_between_main_menus_keeps_session() {
        assert!(!leaves_session(Some(&View::Title), Some(&View::WorldSelect)));
        assert!(!leaves_session(Some(&View::Realms), Some(&View::Title)));
    }

    #[test]
    fn test_leaving_main_menu_keeps_session() {
        assert!(!leaves_session(Some(&View::Title), Some(&View::Connecting)));
        assert!(!leaves_session(Some(&View::InGame), Some(&View::Disconnected)));
        assert!(!leaves_session(Some(&View::Disconnected), None));
    }

    #[test]
    fn test_reauthentication_leaves_session() {
        assert!(is_reauthenticating(
            Some(&View::Disconnected),
            Some(&View::ReAuthentication)
        ));
        assert!(leaves_session(
            Some(&View::Disconnected),
            Some(&View::ReAuthentication)
        ));
        assert!(!leaves_session(
            Some(&View::InGame),
            Some(&View::ReAuthentication)
        ));
    }
}
