use crate::sql::base::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Parses `"col"`, `"col asc"` or `"col desc"`.
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.split_whitespace();
        let column = parts.next().unwrap_or_default().to_string();
        let direction = match parts.next() {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        OrderBy { column, direction }
    }
}

/// `SELECT ... LIMIT ? OFFSET ?` over a single table.
///
/// The rendered statement takes two parameters: the page size, then the
/// offset. Without an `ORDER BY` the database is free to return rows in any
/// order between pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub order_by: Vec<OrderBy>,
}

impl PageQuery {
    pub fn new(table: impl Into<String>) -> Self {
        PageQuery {
            table: table.into(),
            columns: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by<I, S>(mut self, order_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.order_by = order_by
            .into_iter()
            .map(|spec| OrderBy::parse(spec.as_ref()))
            .filter(|o| !o.column.is_empty())
            .collect();
        self
    }

    pub fn is_ordered(&self) -> bool {
        !self.order_by.is_empty()
    }

    /// Short name used as the entity of the produced rows.
    pub fn entity(&self) -> &str {
        self.table.rsplit('.').next().unwrap_or(&self.table)
    }

    pub fn render(&self, dialect: &dyn Dialect) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", dialect.quote_path(&self.table));

        if self.is_ordered() {
            let order = self
                .order_by
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {dir}", dialect.quote_identifier(&o.column))
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {order}"));
        }

        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            dialect.get_placeholder(0),
            dialect.get_placeholder(1)
        ));
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::base::dialect::{MySql, Postgres};

    #[test]
    fn mysql_select_all() {
        let q = PageQuery::new("user_data");
        assert_eq!(q.render(&MySql), "SELECT * FROM `user_data` LIMIT ? OFFSET ?");
    }

    #[test]
    fn postgres_ordered_projection() {
        let q = PageQuery::new("public.user_data")
            .columns(["name", "age"])
            .order_by(["user_id", "age desc"]);

        assert_eq!(
            q.render(&Postgres),
            r#"SELECT "name", "age" FROM "public"."user_data" ORDER BY "user_id" ASC, "age" DESC LIMIT $1 OFFSET $2"#
        );
        assert_eq!(q.entity(), "user_data");
    }

    #[test]
    fn blank_order_entries_are_ignored() {
        let q = PageQuery::new("t").order_by(["", "  "]);
        assert!(!q.is_ordered());
    }
}
