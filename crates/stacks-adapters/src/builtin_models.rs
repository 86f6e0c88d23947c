//! Built-in model definitions shipped with Stacks.

use stacks_core::domain::{ColumnDef, ColumnType, DomainError, TableSchema};

/// Application users. `password` never leaves the process.
pub fn user() -> Result<TableSchema, DomainError> {
    TableSchema::builder("User", "users")
        .column(ColumnDef::new("name", ColumnType::Text).nullable())
        .column(ColumnDef::new("email", ColumnType::Text).unique())
        .column(ColumnDef::new("password", ColumnType::Text).hidden())
        .build()
}

/// Personal access tokens. The token value is hidden like a password.
pub fn access_token() -> Result<TableSchema, DomainError> {
    TableSchema::builder("AccessToken", "access_tokens")
        .column(ColumnDef::new("name", ColumnType::Text))
        .column(ColumnDef::new("token", ColumnType::Text).unique().hidden())
        .build()
}

/// Every built-in model.
pub fn all_models() -> Result<Vec<TableSchema>, DomainError> {
    Ok(vec![user()?, access_token()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models_are_valid() {
        let models = all_models().unwrap();
        assert_eq!(models.len(), 2);
        for model in &models {
            assert!(model.validate().is_ok(), "{} is invalid", model.model());
        }
    }

    #[test]
    fn user_password_is_hidden() {
        let user = user().unwrap();
        assert_eq!(user.hidden_columns().collect::<Vec<_>>(), vec!["password"]);
        assert!(user.column("name").unwrap().nullable);
        assert!(user.column("email").unwrap().unique);
    }
}
