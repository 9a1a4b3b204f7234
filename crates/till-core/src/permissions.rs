//! # Permissions
//!
//! Static role matrix for the register actions. Checked before any storage
//! access, so a denied operator never touches the database.
//!
//! ```text
//!                  open_register  close_register  create_sale  view_reports
//!  super_admin          ✓               ✓              ✓             ✓
//!  admin                ✓               ✓              ✓             ✓
//!  manager              ✓               ✓              ✓             ✓
//!  cashier              ✓               ✓              ✓             ✗
//!  seller               ✗               ✗              ✓             ✗
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Cashier,
    Seller,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::Cashier,
        Role::Seller,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Seller => "seller",
        }
    }

    pub const fn can(&self, permission: Permission) -> bool {
        match self {
            Role::SuperAdmin | Role::Admin | Role::Manager => true,
            Role::Cashier => !matches!(permission, Permission::ViewReports),
            Role::Seller => matches!(permission, Permission::CreateSale),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| ValidationError::not_allowed("role", &Role::ALL.map(|r| r.as_str())))
    }
}

/// Register action guarded by a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    OpenRegister,
    CloseRegister,
    CreateSale,
    ViewReports,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::OpenRegister => "open_register",
            Permission::CloseRegister => "close_register",
            Permission::CreateSale => "create_sale",
            Permission::ViewReports => "view_reports",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Ok(())` if `role` holds `permission`, `PermissionDenied` otherwise.
pub fn authorize(role: Role, permission: Permission) -> CoreResult<()> {
    if role.can(permission) {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied {
            role: role.to_string(),
            permission: permission.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_cannot_touch_register() {
        assert!(authorize(Role::Seller, Permission::CreateSale).is_ok());
        for permission in [Permission::OpenRegister, Permission::CloseRegister, Permission::ViewReports] {
            let err = authorize(Role::Seller, permission).unwrap_err();
            assert!(matches!(err, CoreError::PermissionDenied { .. }));
        }
    }

    #[test]
    fn test_cashier_runs_register_without_reports() {
        assert!(authorize(Role::Cashier, Permission::OpenRegister).is_ok());
        assert!(authorize(Role::Cashier, Permission::CloseRegister).is_ok());
        assert!(authorize(Role::Cashier, Permission::CreateSale).is_ok());
        let err = authorize(Role::Cashier, Permission::ViewReports).unwrap_err();
        assert_eq!(err.to_string(), "Role cashier is not allowed to view_reports");
    }

    #[test]
    fn test_admins_hold_everything() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Manager] {
            for permission in [
                Permission::OpenRegister,
                Permission::CloseRegister,
                Permission::CreateSale,
                Permission::ViewReports,
            ] {
                assert!(role.can(permission), "{role} {permission}");
            }
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("super-admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("Cashier".parse::<Role>().unwrap(), Role::Cashier);
        assert!("owner".parse::<Role>().is_err());
    }
}
