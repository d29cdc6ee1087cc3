use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    MySql,
    Postgres,
    Csv,
}

impl DataFormat {
    pub fn is_sql(&self) -> bool {
        matches!(self, DataFormat::MySql | DataFormat::Postgres)
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DataFormat::MySql),
            "pg" | "postgres" | "postgresql" => Ok(DataFormat::Postgres),
            "csv" => Ok(DataFormat::Csv),
            other => Err(format!("Unknown data format: {other}")),
        }
    }
}

impl Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::MySql => write!(f, "MySQL"),
            DataFormat::Postgres => write!(f, "Postgres"),
            DataFormat::Csv => write!(f, "CSV"),
        }
    }
}
