use crate::core::PosStore;
use crate::domain::model::{Page, Permissions, Role};
use crate::utils::error::{PosError, Result};
use chrono::Utc;

pub const ADMIN_ROLE: &str = "Admin";
pub const STAFF_ROLE: &str = "Staff";

/// Pages shown in the role listing. Profile, Home and Audit Log are left out.
const LISTED_PAGES: [Page; 9] = [
    Page::Dashboard,
    Page::TakeOrders,
    Page::ViewOrders,
    Page::Stocks,
    Page::MenuCustomization,
    Page::OrderHistory,
    Page::UserManagement,
    Page::SessionManagement,
    Page::Settings,
];

impl Permissions {
    pub fn all() -> Self {
        Permissions::default().with(&Page::ALL)
    }

    pub fn none() -> Self {
        Permissions::default()
    }

    pub fn accessible_pages(&self) -> Vec<&'static str> {
        LISTED_PAGES
            .into_iter()
            .filter(|page| self.allows(*page))
            .map(Page::label)
            .collect()
    }
}

pub fn default_roles() -> Vec<Role> {
    let now = Utc::now();
    vec![
        Role {
            role_id: 1,
            role_name: ADMIN_ROLE.to_string(),
            permissions: Permissions::all(),
            created_at: Some(now),
        },
        Role {
            role_id: 2,
            role_name: STAFF_ROLE.to_string(),
            permissions: Permissions::none().with(&[
                Page::Profile,
                Page::Home,
                Page::Dashboard,
                Page::TakeOrders,
                Page::ViewOrders,
            ]),
            created_at: Some(now),
        },
    ]
}

/// Seeds Admin and Staff when no roles exist; returns the current roles.
pub async fn ensure_roles<S: PosStore + ?Sized>(store: &S) -> Result<Vec<Role>> {
    let roles = store.roles().await?;
    if !roles.is_empty() {
        return Ok(roles);
    }

    tracing::info!("No roles found, seeding defaults");
    let roles = default_roles();
    store.save_roles(&roles).await?;
    Ok(roles)
}

/// Case-insensitive lookup; unknown names resolve to Staff.
pub fn resolve_role<'a>(roles: &'a [Role], name: Option<&str>) -> Option<&'a Role> {
    let find = |wanted: &str| {
        let wanted = wanted.trim().to_lowercase();
        roles
            .iter()
            .find(|r| r.role_name.to_lowercase() == wanted)
    };

    match name.filter(|n| !n.trim().is_empty()) {
        Some(n) => find(n).or_else(|| {
            tracing::warn!("Unknown role '{}', falling back to {}", n, STAFF_ROLE);
            find(STAFF_ROLE)
        }),
        None => find(STAFF_ROLE),
    }
}

pub fn authorize(role: &Role, page: Page) -> Result<()> {
    if role.permissions.allows(page) {
        Ok(())
    } else {
        tracing::debug!("{} denied {}", role.role_name, page);
        Err(PosError::AccessDenied {
            role: role.role_name.clone(),
            page: page.to_string(),
        })
    }
}

/// Next free role id for a new role.
pub fn next_role_id(roles: &[Role]) -> u32 {
    roles.iter().map(|r| r.role_id).max().unwrap_or(0) + 1
}
