//! Role and permission model.
//!
//! Authorization is decided once at the route boundary against a closed set
//! of role variants; services below this layer never inspect the actor's
//! role. Negative manual adjustments carry their own capability so they can
//! be restricted to managers and above.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

/// Permission constants used to gate route groups.
pub mod consts {
    pub const ITEMS_READ: &str = "items:read";
    pub const ITEMS_WRITE: &str = "items:write";
    pub const STOCK_ADJUST: &str = "stock:adjust";
    pub const STOCK_ADJUST_NEGATIVE: &str = "stock:adjust-negative";
    pub const MOVEMENTS_READ: &str = "movements:read";
    pub const SALES_READ: &str = "sales:read";
    pub const SALES_CREATE: &str = "sales:create";
    pub const SALES_RETURN: &str = "sales:return";
    pub const OUTGOING_READ: &str = "outgoing:read";
    pub const OUTGOING_CREATE: &str = "outgoing:create";
    pub const CATALOG_READ: &str = "catalog:read";
    pub const CATALOG_WRITE: &str = "catalog:write";
    pub const DASHBOARD_READ: &str = "dashboard:read";
    pub const USERS_MANAGE: &str = "users:manage";
}

impl Role {
    /// Permissions granted to this role.
    pub fn permissions(&self) -> Vec<&'static str> {
        use consts::*;

        let staff = vec![
            ITEMS_READ,
            MOVEMENTS_READ,
            SALES_READ,
            SALES_CREATE,
            OUTGOING_READ,
            CATALOG_READ,
            DASHBOARD_READ,
        ];
        match self {
            Role::Staff => staff,
            Role::Manager => {
                let mut perms = staff;
                perms.extend([
                    ITEMS_WRITE,
                    STOCK_ADJUST,
                    STOCK_ADJUST_NEGATIVE,
                    SALES_RETURN,
                    OUTGOING_CREATE,
                    CATALOG_WRITE,
                ]);
                perms
            }
            Role::Admin => {
                let mut perms = Role::Manager.permissions();
                perms.push(USERS_MANAGE);
                perms
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parsing() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("staff").unwrap(), Role::Staff);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn staff_cannot_adjust_stock() {
        let perms = Role::Staff.permissions();
        assert!(perms.contains(&consts::SALES_CREATE));
        assert!(!perms.contains(&consts::STOCK_ADJUST));
        assert!(!perms.contains(&consts::STOCK_ADJUST_NEGATIVE));
    }

    #[test]
    fn manager_gains_adjust_but_not_user_management() {
        let perms = Role::Manager.permissions();
        assert!(perms.contains(&consts::STOCK_ADJUST));
        assert!(perms.contains(&consts::STOCK_ADJUST_NEGATIVE));
        assert!(!perms.contains(&consts::USERS_MANAGE));
    }

    #[test]
    fn admin_has_every_permission() {
        let perms = Role::Admin.permissions();
        for p in Role::Manager.permissions() {
            assert!(perms.contains(&p));
        }
        assert!(perms.contains(&consts::USERS_MANAGE));
    }
}
