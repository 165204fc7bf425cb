//! Edit permissions for items and properties
//!
//! Permissions are a small flag set (`Create`, `Modify`, `Delete`) that is
//! attached to every item and every schema entry. Permissions propagate from
//! parent to child by intersection: a child can never be *less* restricted
//! than its ancestors.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// Flag set describing which edits are allowed on an item.
///
/// ```
/// use restree_core::permission::EditPermission;
///
/// let perms = EditPermission::CREATE | EditPermission::MODIFY;
/// assert!(perms.can_create());
/// assert!(!perms.can_delete());
/// assert_eq!(perms & EditPermission::MODIFY, EditPermission::MODIFY);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditPermission(u8);

impl EditPermission {
    /// No permissions
    pub const NONE: EditPermission = EditPermission(0b0000_0000);
    /// Element can be created if it doesn't yet exist
    pub const CREATE: EditPermission = EditPermission(0b0000_0001);
    /// Element can be modified if it exists
    pub const MODIFY: EditPermission = EditPermission(0b0000_0010);
    /// Element can be deleted if it exists
    pub const DELETE: EditPermission = EditPermission(0b0000_0100);
    /// Create & modify
    pub const CREATE_MODIFY: EditPermission = EditPermission(0b0000_0011);
    /// Modify & delete
    pub const MODIFY_DELETE: EditPermission = EditPermission(0b0000_0110);
    /// Create, modify & delete
    pub const ALL: EditPermission = EditPermission(0b0000_0111);

    /// Whether the Create bit is set
    pub fn can_create(self) -> bool {
        self & Self::CREATE == Self::CREATE
    }

    /// Whether the Modify bit is set
    pub fn can_modify(self) -> bool {
        self & Self::MODIFY == Self::MODIFY
    }

    /// Whether the Delete bit is set
    pub fn can_delete(self) -> bool {
        self & Self::DELETE == Self::DELETE
    }

    /// True when no bit is set
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// The bits of `required` that this permission set lacks.
    ///
    /// ```
    /// use restree_core::permission::EditPermission;
    ///
    /// let have = EditPermission::MODIFY;
    /// let need = EditPermission::CREATE_MODIFY;
    /// assert_eq!(have.missing(need), EditPermission::CREATE);
    /// ```
    pub fn missing(self, required: EditPermission) -> EditPermission {
        required & !self
    }

    /// Checks that all bits of `required` are present, reporting the missing
    /// ones against the named item otherwise.
    pub fn check(self, required: EditPermission, item: &str) -> TreeResult<()> {
        let missing = self.missing(required);
        if missing.is_none() {
            Ok(())
        } else {
            Err(TreeError::missing_permissions(item, missing))
        }
    }
}

impl BitOr for EditPermission {
    type Output = EditPermission;

    fn bitor(self, rhs: Self) -> Self {
        EditPermission(self.0 | rhs.0)
    }
}

impl BitOrAssign for EditPermission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EditPermission {
    type Output = EditPermission;

    fn bitand(self, rhs: Self) -> Self {
        EditPermission(self.0 & rhs.0)
    }
}

impl BitAndAssign for EditPermission {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for EditPermission {
    type Output = EditPermission;

    fn not(self) -> Self {
        EditPermission(!self.0 & Self::ALL.0)
    }
}

impl fmt::Display for EditPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "None");
        }

        let mut names = Vec::with_capacity(3);
        if self.can_create() {
            names.push("Create");
        }
        if self.can_modify() {
            names.push("Modify");
        }
        if self.can_delete() {
            names.push("Delete");
        }
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_is_bitwise() {
        let perms = EditPermission::CREATE | EditPermission::DELETE;
        assert!(perms.can_create());
        assert!(!perms.can_modify());
        assert!(perms.can_delete());
    }

    #[test]
    fn intersection_restricts() {
        let parent = EditPermission::MODIFY;
        let child = EditPermission::ALL;
        let effective = parent & child;
        assert_eq!(effective, EditPermission::MODIFY);
    }

    #[test]
    fn missing_reports_per_bit() {
        let have = EditPermission::NONE;
        assert_eq!(have.missing(EditPermission::ALL), EditPermission::ALL);

        let have = EditPermission::CREATE_MODIFY;
        assert_eq!(have.missing(EditPermission::ALL), EditPermission::DELETE);
        assert_eq!(
            have.missing(EditPermission::CREATE),
            EditPermission::NONE
        );
    }

    #[test]
    fn check_names_the_item() {
        let err = EditPermission::NONE
            .check(EditPermission::MODIFY, "contact.name")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("contact.name"));
        assert!(msg.contains("Modify"));
    }

    #[test]
    fn friendly_names() {
        assert_eq!(EditPermission::NONE.to_string(), "None");
        assert_eq!(EditPermission::ALL.to_string(), "Create, Modify, Delete");
        assert_eq!(
            (EditPermission::MODIFY | EditPermission::DELETE).to_string(),
            "Modify, Delete"
        );
    }
}
