use crate::domain::{
    entities::{
        Row, TableSchema,
        options::Sort,
        plan::{OrderBy, Projection},
    },
    error::DomainError,
};

/// Centralized domain validation.
///
/// All request-shape validation lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_schema(schema: &TableSchema) -> Result<(), DomainError> {
        schema.validate()
    }

    /// Check and coerce values a caller wants to write.
    ///
    /// Rejects unknown columns and framework-managed columns (identity and
    /// reserved timestamps).
    pub fn validate_write(schema: &TableSchema, values: Row) -> Result<Row, DomainError> {
        values
            .into_iter()
            .map(|(column, value)| {
                let def = schema.require_column(&column)?;
                if def.managed {
                    return Err(DomainError::ReadOnlyColumn { column });
                }
                let coerced = value.coerce(&column, def.ty)?;
                Ok((column, coerced))
            })
            .collect()
    }

    /// Resolve an optional field list into a projection.
    ///
    /// The identity column is always projected so the result stays
    /// addressable by instance operations.
    pub fn validate_projection<S: AsRef<str>>(
        schema: &TableSchema,
        fields: Option<&[S]>,
    ) -> Result<Projection, DomainError> {
        let Some(fields) = fields else {
            return Ok(Projection::All);
        };

        let mut columns = vec![schema.primary_key().to_string()];
        for field in fields {
            let field = field.as_ref();
            schema.require_column(field)?;
            if !columns.iter().any(|c| c == field) {
                columns.push(field.to_string());
            }
        }
        Ok(Projection::Columns(columns))
    }

    pub fn validate_sort(schema: &TableSchema, sort: &Sort) -> Result<OrderBy, DomainError> {
        schema.require_column(&sort.column)?;
        Ok(OrderBy::new(sort.column.as_str(), sort.direction))
    }
}
