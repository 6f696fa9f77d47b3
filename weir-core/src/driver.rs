use crate::{Connection, SqlWriter};
use convert_case::{Case, Casing};

/// Naming convention used to build foreign key names from a model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyNaming {
    /// `user_id`
    #[default]
    SnakeCase,
    /// `userId`
    CamelCase,
}

impl KeyNaming {
    pub fn foreign_key(&self, model: &str, id_key: &str) -> String {
        let key = format!("{}_{}", model, id_key);
        match self {
            KeyNaming::SnakeCase => key.to_case(Case::Snake),
            KeyNaming::CamelCase => key.to_case(Case::Camel),
        }
    }
}

pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Default identifier field name.
    fn id_key(&self) -> &'static str {
        "id"
    }

    fn key_naming(&self) -> KeyNaming {
        KeyNaming::SnakeCase
    }
}
