use serde::Serialize;

use crate::models::auth::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: String,
    pub href: String,
}

impl MenuItem {
    fn new(title: &str, href: &str) -> Self {
        Self {
            title: title.to_string(),
            href: href.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
    pub account: Vec<MenuItem>,
}

/// Top menu for the current caller. "All Booking" is admin-only.
pub fn menu_for(session: Option<&SessionContext>) -> Menu {
    let mut items = vec![
        MenuItem::new("Booking", "/booking"),
        MenuItem::new("My Booking", "/mybooking"),
        MenuItem::new("Provider", "/provider"),
    ];

    let account = match session {
        Some(ctx) => {
            if ctx.is_admin() {
                items.push(MenuItem::new("All Booking", "/allbooking"));
            }
            let mut label = format!("Sign-Out of {}", ctx.identity.name);
            if ctx.is_admin() {
                label.push_str(" (Admin)");
            }
            vec![MenuItem::new(&label, "/auth/logout")]
        }
        None => vec![
            MenuItem::new("Sign-In", "/auth/login"),
            MenuItem::new("Register", "/register"),
        ],
    };

    Menu { items, account }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, UserIdentity};
    use crate::services::session::SessionService;

    fn session(role: Role) -> SessionContext {
        let identity = UserIdentity {
            id: "1".into(),
            name: "Ann".into(),
            email: "a@b.com".into(),
            role,
            bearer_token: "tok".into(),
        };
        SessionService::new("s", 60).mint(&identity).unwrap().1
    }

    #[test]
    fn anonymous_menu_offers_sign_in() {
        let menu = menu_for(None);
        assert_eq!(menu.items.len(), 3);
        assert_eq!(menu.account[0].title, "Sign-In");
    }

    #[test]
    fn admin_sees_all_bookings() {
        let menu = menu_for(Some(&session(Role::Admin)));
        assert_eq!(menu.items.last().unwrap().href, "/allbooking");
        assert_eq!(menu.account[0].title, "Sign-Out of Ann (Admin)");

        let menu = menu_for(Some(&session(Role::User)));
        assert!(menu.items.iter().all(|i| i.href != "/allbooking"));
        assert_eq!(menu.account[0].title, "Sign-Out of Ann");
    }
}
