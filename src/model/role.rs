use derive_more::Display;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// HR staff and administrators manage other employees' leave.
    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for id in 1..=5 {
            let role = Role::from_id(id).expect("known role id");
            assert_eq!(role.id(), id);
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
    }

    #[test]
    fn only_hr_and_admin_manage_leave() {
        assert!(Role::Admin.is_hr_or_admin());
        assert!(Role::Hr.is_hr_or_admin());
        assert!(!Role::Employee.is_hr_or_admin());
        assert!(!Role::ApiUser.is_hr_or_admin());
        assert_eq!(Role::Hr.to_string(), "Hr");
    }
}
