//! Identifier quoting and placeholder rendering.
//!
//! Every identifier a scope writes into SQL goes through a [`Dialect`].
//! Keeping quoting in one place means the only injection surface left in the
//! scope builders is the documented literal rendering of set membership.

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes a single identifier, doubling any embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quotes a possibly schema-qualified table name (`schema.table`).
    fn quote_table_name(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a column name.
    fn quote_column_name(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// Returns `"table"."column"`.
    fn qualified_column(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_table_name(table),
            self.quote_column_name(column)
        )
    }

    /// Returns the placeholder for the parameter at `index` (1-based).
    fn placeholder(&self, index: usize) -> String;
}

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rewrites `?` placeholders into `$1, $2, ...`.
    ///
    /// Question marks inside single-quoted literals and double-quoted
    /// identifiers are left alone. A doubled `??`
    /// outside quotes renders a literal `?`, so jsonb operators such as `?|`
    /// stay expressible in raw conditions.
    #[must_use]
    pub fn number_placeholders(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut chars = sql.chars().peekable();
        let mut index = 0;
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if let Some(q) = quote {
                out.push(c);
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' if chars.peek() == Some(&'?') => {
                    chars.next();
                    out.push('?');
                }
                '?' => {
                    index += 1;
                    out.push_str(&self.placeholder(index));
                }
                _ => out.push(c),
            }
        }
        out
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        let d = PostgresDialect::new();
        assert_eq!(d.name(), "postgresql");
        assert_eq!(d.quote_identifier("permissions"), "\"permissions\"");
        assert_eq!(d.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_table_name_with_schema() {
        let d = PostgresDialect::new();
        assert_eq!(d.quote_table_name("users"), "\"users\"");
        assert_eq!(d.quote_table_name("auth.users"), "\"auth\".\"users\"");
    }

    #[test]
    fn test_qualified_column() {
        let d = PostgresDialect::new();
        assert_eq!(d.qualified_column("users", "roles"), "\"users\".\"roles\"");
    }

    #[test]
    fn test_number_placeholders() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.number_placeholders("a = ? AND b @> ARRAY[?, ?]::text[]"),
            "a = $1 AND b @> ARRAY[$2, $3]::text[]"
        );
    }

    #[test]
    fn test_number_placeholders_skips_quoted_text() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.number_placeholders("name = 'who?' AND \"odd?\" = ?"),
            "name = 'who?' AND \"odd?\" = $1"
        );
        assert_eq!(d.number_placeholders("'it''s?' = ?"), "'it''s?' = $1");
    }

    #[test]
    fn test_number_placeholders_escaped_question_mark() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.number_placeholders("data ?? 'key' AND id = ?"),
            "data ? 'key' AND id = $1"
        );
    }
}
