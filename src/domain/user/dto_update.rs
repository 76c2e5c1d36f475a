use super::UserRole;

#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<bool>,
}

impl UpdateUserDto {
    /// Whether the update touches fields reserved to administrators.
    pub fn changes_privileges(&self) -> bool {
        self.role.is_some() || self.status.is_some()
    }
}
