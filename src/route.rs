//! Typed navigation between screens.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Dashboard,
    Tasks,
    Upload,
    Map,
    Chat,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Tasks, Tab::Upload, Tab::Map, Tab::Chat];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Home",
            Tab::Tasks => "Tasks",
            Tab::Upload => "Upload",
            Tab::Map => "Map",
            Tab::Chat => "Assistant",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Tab(Tab),
    TaskDetail { task_id: String },
}

/// Identity of a screen, used to scope background work to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Signup,
    Dashboard,
    Tasks,
    Upload,
    Map,
    Chat,
    TaskDetail,
}

impl Route {
    pub fn screen(&self) -> Screen {
        match self {
            Route::Login => Screen::Login,
            Route::Signup => Screen::Signup,
            Route::Tab(Tab::Dashboard) => Screen::Dashboard,
            Route::Tab(Tab::Tasks) => Screen::Tasks,
            Route::Tab(Tab::Upload) => Screen::Upload,
            Route::Tab(Tab::Map) => Screen::Map,
            Route::Tab(Tab::Chat) => Screen::Chat,
            Route::TaskDetail { .. } => Screen::TaskDetail,
        }
    }

    pub fn requires_login(&self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }
}

/// Current route plus a back stack.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Open `route` on top of the current one. Routes behind a login wall
    /// redirect to the login screen when no one is logged in.
    /// Returns the screen that was left, if any.
    pub fn push(&mut self, route: Route, logged_in: bool) -> Option<Screen> {
        let route = Self::gate(route, logged_in);
        if route == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, route);
        let left = previous.screen();
        self.stack.push(previous);
        Some(left)
    }

    /// Swap the current route without growing the back stack.
    pub fn replace(&mut self, route: Route, logged_in: bool) -> Option<Screen> {
        let route = Self::gate(route, logged_in);
        if route == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, route);
        Some(previous.screen())
    }

    /// Return to the previous route. Stays put when the stack is empty.
    pub fn back(&mut self) -> Option<Screen> {
        let previous = self.stack.pop()?;
        let left = std::mem::replace(&mut self.current, previous);
        Some(left.screen())
    }

    /// Drop the whole history and start again at `route`.
    pub fn reset_to(&mut self, route: Route) -> Vec<Screen> {
        let mut left: Vec<Screen> = self.stack.drain(..).map(|r| r.screen()).collect();
        let previous = std::mem::replace(&mut self.current, route);
        left.push(previous.screen());
        left
    }

    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty()
    }

    fn gate(route: Route, logged_in: bool) -> Route {
        if route.requires_login() && !logged_in {
            tracing::warn!(?route, "Navigation requires login, redirecting");
            Route::Login
        } else {
            route
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let mut nav = Navigator::new(Route::Tab(Tab::Dashboard));
        let left = nav.push(
            Route::TaskDetail {
                task_id: "t1".to_string(),
            },
            true,
        );
        assert_eq!(left, Some(Screen::Dashboard));
        assert_eq!(nav.current().screen(), Screen::TaskDetail);

        assert_eq!(nav.back(), Some(Screen::TaskDetail));
        assert_eq!(nav.current(), &Route::Tab(Tab::Dashboard));
        assert_eq!(nav.back(), None);
    }

    #[test]
    fn test_replace_keeps_stack() {
        let mut nav = Navigator::new(Route::Tab(Tab::Dashboard));
        nav.replace(Route::Tab(Tab::Map), true);
        assert!(!nav.can_go_back());
        assert_eq!(nav.current(), &Route::Tab(Tab::Map));
        assert_eq!(nav.replace(Route::Tab(Tab::Map), true), None);
    }

    #[test]
    fn test_gated_routes_redirect_to_login() {
        let mut nav = Navigator::new(Route::Login);
        nav.push(Route::Tab(Tab::Tasks), false);
        assert_eq!(nav.current(), &Route::Login);

        nav.push(Route::Signup, false);
        assert_eq!(nav.current(), &Route::Signup);
    }

    #[test]
    fn test_reset_reports_every_left_screen() {
        let mut nav = Navigator::new(Route::Tab(Tab::Dashboard));
        nav.push(Route::Tab(Tab::Chat), true);
        nav.push(
            Route::TaskDetail {
                task_id: "t2".to_string(),
            },
            true,
        );
        let left = nav.reset_to(Route::Login);
        assert_eq!(left, vec![Screen::Dashboard, Screen::Chat, Screen::TaskDetail]);
        assert!(!nav.can_go_back());
        assert_eq!(nav.current(), &Route::Login);
    }

    #[test]
    fn test_tab_index() {
        assert_eq!(Tab::Dashboard.index(), 0);
        assert_eq!(Tab::Chat.index(), 4);
    }
}
