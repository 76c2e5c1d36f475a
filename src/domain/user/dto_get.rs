use super::UserRole;
use crate::shared::SortOrder;

#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    /// Case-insensitive substring over name and email
    pub search: Option<String>,
    pub role: Option<UserRole>,
    /// `None` lists active users only
    pub status: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: SortOrder,
}
