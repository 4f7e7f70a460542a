use std::fmt;

use serde::Serialize;

use crate::ModelError;

/// Schema-qualified table identity shared by source, target and hub tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableIdent {
    pub schema: String,
    pub name: String,
}

impl TableIdent {
    /// Split `schema.table`, normalizing to lower case.
    ///
    /// A name without a schema component, or with more than one separator,
    /// is rejected.
    pub fn parse(qualified: &str) -> Result<Self, ModelError> {
        let trimmed = qualified.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyTableName);
        }
        let parts: Vec<&str> = trimmed.split('.').collect();
        match parts.as_slice() {
            [_] => Err(ModelError::MissingSchema(trimmed.to_string())),
            [schema, name] if !schema.trim().is_empty() && !name.trim().is_empty() => Ok(Self {
                schema: schema.trim().to_lowercase(),
                name: name.trim().to_lowercase(),
            }),
            [schema, _] if schema.trim().is_empty() => {
                Err(ModelError::MissingSchema(trimmed.to_string()))
            }
            _ => Err(ModelError::InvalidQualifiedName(trimmed.to_string())),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_schema_and_name() {
        let ident = TableIdent::parse(" Sales.Orders ").unwrap();
        assert_eq!(ident.schema, "sales");
        assert_eq!(ident.name, "orders");
        assert_eq!(ident.qualified(), "sales.orders");
    }

    #[test]
    fn rejects_missing_schema() {
        assert_eq!(
            TableIdent::parse("orders"),
            Err(ModelError::MissingSchema("orders".to_string()))
        );
        assert_eq!(
            TableIdent::parse(".orders"),
            Err(ModelError::MissingSchema(".orders".to_string()))
        );
    }

    #[test]
    fn rejects_extra_separators() {
        assert!(matches!(
            TableIdent::parse("db.sales.orders"),
            Err(ModelError::InvalidQualifiedName(_))
        ));
        assert!(matches!(
            TableIdent::parse("sales."),
            Err(ModelError::InvalidQualifiedName(_))
        ));
        assert_eq!(TableIdent::parse("  "), Err(ModelError::EmptyTableName));
    }
}
