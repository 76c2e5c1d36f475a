#[derive(Debug, Clone)]
pub struct UpdateCredentialsDto {
    pub email: String,
    pub password_hash: String,
}
