//! Renders execution plans as parameterised SQL.
//!
//! Values never appear in the SQL text; they are collected in order into
//! [`SqlStatement::params`]. `LIMIT`/`OFFSET` are rendered inline since they
//! are always integers produced by the gateway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stacks_core::domain::{
    CountPlan, DeletePlan, DomainError, InsertPlan, Predicate, Projection, SelectPlan, SortDirection,
    UpdatePlan, Value,
};

/// SQL flavour to render for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
}

impl Dialect {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }

    fn quote(self, identifier: &str) -> String {
        match self {
            Self::Mysql => format!("`{}`", identifier.replace('`', "``")),
            Self::Sqlite | Self::Postgres => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    const fn supports_returning(self) -> bool {
        !matches!(self, Self::Mysql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            other => Err(DomainError::InvalidModelDefinition(format!(
                "unknown SQL dialect: {other}"
            ))),
        }
    }
}

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Stateless plan renderer for one [`Dialect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer {
    dialect: Dialect,
}

impl SqlRenderer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn select(&self, plan: &SelectPlan) -> SqlStatement {
        let mut out = Builder::new(self.dialect);

        let columns = match &plan.projection {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => self.column_list(columns),
        };
        out.push(&format!(
            "SELECT {} FROM {}",
            columns,
            self.dialect.quote(&plan.table)
        ));
        out.where_clause(&plan.predicates);

        if !plan.order.is_empty() {
            let terms: Vec<_> = plan
                .order
                .iter()
                .map(|o| {
                    let direction = match o.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {}", self.dialect.quote(&o.column), direction)
                })
                .collect();
            out.push(&format!(" ORDER BY {}", terms.join(", ")));
        }

        match (plan.limit, plan.offset) {
            (Some(limit), Some(offset)) => out.push(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => out.push(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => match self.dialect {
                Dialect::Postgres => out.push(&format!(" OFFSET {offset}")),
                Dialect::Sqlite => out.push(&format!(" LIMIT -1 OFFSET {offset}")),
                Dialect::Mysql => out.push(&format!(" LIMIT {} OFFSET {offset}", u64::MAX)),
            },
            (None, None) => {}
        }

        out.finish()
    }

    pub fn count(&self, plan: &CountPlan) -> SqlStatement {
        let mut out = Builder::new(self.dialect);
        out.push(&format!(
            "SELECT COUNT(*) FROM {}",
            self.dialect.quote(&plan.table)
        ));
        out.where_clause(&plan.predicates);
        out.finish()
    }

    pub fn insert(&self, plan: &InsertPlan) -> SqlStatement {
        let mut out = Builder::new(self.dialect);
        let table = self.dialect.quote(&plan.table);

        if plan.values.is_empty() {
            match self.dialect {
                Dialect::Mysql => out.push(&format!("INSERT INTO {table} () VALUES ()")),
                _ => out.push(&format!("INSERT INTO {table} DEFAULT VALUES")),
            }
        } else {
            let columns: Vec<_> = plan.values.keys().cloned().collect();
            let placeholders: Vec<_> = plan
                .values
                .values()
                .map(|value| out.bind(value.clone()))
                .collect();
            out.push(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                self.column_list(&columns),
                placeholders.join(", ")
            ));
        }

        out.returning();
        out.finish()
    }

    pub fn update(&self, plan: &UpdatePlan) -> SqlStatement {
        let mut out = Builder::new(self.dialect);
        let assignments: Vec<_> = plan
            .set
            .iter()
            .map(|(column, value)| {
                let placeholder = out.bind(value.clone());
                format!("{} = {}", self.dialect.quote(column), placeholder)
            })
            .collect();

        out.push(&format!(
            "UPDATE {} SET {}",
            self.dialect.quote(&plan.table),
            assignments.join(", ")
        ));
        out.where_clause(&plan.predicates);
        out.returning();
        out.finish()
    }

    pub fn delete(&self, plan: &DeletePlan) -> SqlStatement {
        let mut out = Builder::new(self.dialect);
        out.push(&format!("DELETE FROM {}", self.dialect.quote(&plan.table)));
        out.where_clause(&plan.predicates);
        out.returning();
        out.finish()
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.dialect.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

struct Builder {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl Builder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    /// Record a parameter and return its placeholder.
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        match self.dialect {
            Dialect::Postgres => format!("${}", self.params.len()),
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
        }
    }

    fn where_clause(&mut self, predicates: &[Predicate]) {
        if predicates.is_empty() {
            return;
        }

        let terms: Vec<_> = predicates.iter().map(|p| self.term(p)).collect();
        self.push(&format!(" WHERE {}", terms.join(" AND ")));
    }

    fn term(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Eq { column, value } => {
                let placeholder = self.bind(value.clone());
                format!("{} = {}", self.dialect.quote(column), placeholder)
            }
            Predicate::IsNull { column } => format!("{} IS NULL", self.dialect.quote(column)),
            Predicate::In { values, .. } if values.is_empty() => "1 = 0".to_string(),
            Predicate::In { column, values } => {
                let placeholders: Vec<_> = values.iter().map(|v| self.bind(v.clone())).collect();
                format!(
                    "{} IN ({})",
                    self.dialect.quote(column),
                    placeholders.join(", ")
                )
            }
        }
    }

    fn returning(&mut self) {
        if self.dialect.supports_returning() {
            self.push(" RETURNING *");
        }
    }

    fn finish(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use stacks_core::domain::{OrderBy, Row};

    use super::*;

    fn pg() -> SqlRenderer {
        SqlRenderer::new(Dialect::Postgres)
    }

    #[test]
    fn null_criteria_render_is_null_not_equality() {
        let plan = SelectPlan::new("users")
            .filter(Predicate::is_null("name"))
            .filter(Predicate::eq("email", "ada@example.com"));

        let stmt = pg().select(&plan);

        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "users" WHERE "name" IS NULL AND "email" = $1"#
        );
        assert_eq!(stmt.params, vec![Value::from("ada@example.com")]);
    }

    #[test]
    fn select_with_projection_order_and_window() {
        let plan = SelectPlan::new("users")
            .project(Projection::Columns(vec!["id".into(), "email".into()]))
            .order_by(OrderBy::new("created_at", SortDirection::Desc))
            .limit(Some(10))
            .offset(Some(20));

        assert_eq!(
            pg().select(&plan).sql,
            r#"SELECT "id", "email" FROM "users" ORDER BY "created_at" DESC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn offset_without_limit_per_dialect() {
        let plan = SelectPlan::new("t").offset(Some(5));

        assert_eq!(pg().select(&plan).sql, r#"SELECT * FROM "t" OFFSET 5"#);
        assert_eq!(
            SqlRenderer::new(Dialect::Sqlite).select(&plan).sql,
            r#"SELECT * FROM "t" LIMIT -1 OFFSET 5"#
        );
    }

    #[test]
    fn empty_in_list_renders_false_condition() {
        let plan = SelectPlan::new("users").filter(Predicate::is_in("id", vec![]));
        let stmt = pg().select(&plan);

        assert_eq!(stmt.sql, r#"SELECT * FROM "users" WHERE 1 = 0"#);
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn mysql_uses_backticks_and_question_marks() {
        let plan = SelectPlan::new("users")
            .filter(Predicate::is_in("id", vec![Value::from(1), Value::from(2)]));

        let stmt = SqlRenderer::new(Dialect::Mysql).select(&plan);
        assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `id` IN (?, ?)");
    }

    #[test]
    fn update_numbers_set_params_before_where_params() {
        let plan = UpdatePlan {
            table: "users".into(),
            set: Row::from([("name".to_string(), Value::from("Ada L."))]),
            predicates: vec![Predicate::eq("id", 1)],
        };

        let stmt = pg().update(&plan);
        assert_eq!(
            stmt.sql,
            r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2 RETURNING *"#
        );
        assert_eq!(stmt.params, vec![Value::from("Ada L."), Value::from(1)]);
    }

    #[test]
    fn insert_and_delete_return_rows_where_supported() {
        let insert = InsertPlan {
            table: "users".into(),
            values: Row::from([("email".to_string(), Value::from("a@x"))]),
        };
        assert_eq!(
            pg().insert(&insert).sql,
            r#"INSERT INTO "users" ("email") VALUES ($1) RETURNING *"#
        );
        assert_eq!(
            SqlRenderer::new(Dialect::Mysql).insert(&insert).sql,
            "INSERT INTO `users` (`email`) VALUES (?)"
        );

        let delete = DeletePlan {
            table: "users".into(),
            predicates: vec![Predicate::eq("id", 3)],
        };
        assert_eq!(
            pg().delete(&delete).sql,
            r#"DELETE FROM "users" WHERE "id" = $1 RETURNING *"#
        );
    }

    #[test]
    fn identifiers_are_escaped() {
        let plan = SelectPlan::new(r#"we"ird"#);
        assert_eq!(pg().select(&plan).sql, r#"SELECT * FROM "we""ird""#);
    }

    #[test]
    fn dialect_parses_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
