use serde::{Deserialize, Serialize};

/// Capabilities granted to admin users. The policy is flat: every admin
/// holds every permission, so this set never differentiates between admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    ViewUsers,
    DeleteUsers,
    ViewAnalytics,
    ManageSystem,
    ManageDiscounts,
}

impl AdminPermission {
    pub const ALL: &'static [AdminPermission] = &[
        AdminPermission::ViewUsers,
        AdminPermission::DeleteUsers,
        AdminPermission::ViewAnalytics,
        AdminPermission::ManageSystem,
        AdminPermission::ManageDiscounts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminPermission::ViewUsers => "view_users",
            AdminPermission::DeleteUsers => "delete_users",
            AdminPermission::ViewAnalytics => "view_analytics",
            AdminPermission::ManageSystem => "manage_system",
            AdminPermission::ManageDiscounts => "manage_discounts",
        }
    }
}

/// Email allowlist check. Built once from configuration and immutable for
/// the process lifetime.
#[derive(Debug, Clone)]
pub struct AccessGate {
    admin_emails: Vec<String>,
}

impl AccessGate {
    pub fn new(admin_emails: Vec<String>) -> Self {
        Self { admin_emails }
    }

    pub fn admin_emails(&self) -> &[String] {
        &self.admin_emails
    }

    /// True when the email matches an allowlist entry. Comparison is
    /// case-insensitive with surrounding whitespace ignored on both sides.
    pub fn is_admin(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }

        let is_admin = self
            .admin_emails
            .iter()
            .any(|entry| entry.trim().to_lowercase() == normalized);

        if !is_admin {
            tracing::debug!(
                email = %email,
                normalized = %normalized,
                allowlist_len = self.admin_emails.len(),
                "email not found in admin allowlist"
            );
        }

        is_admin
    }

    /// Every admin gets the full permission set; non-admins get none.
    pub fn permissions(&self, email: Option<&str>) -> &'static [AdminPermission] {
        if self.is_admin(email) {
            AdminPermission::ALL
        } else {
            &[]
        }
    }

    pub fn has_permission(&self, email: Option<&str>, permission: AdminPermission) -> bool {
        self.permissions(email).contains(&permission)
    }
}
