//! SQL rendering of compiled filters.
//!
//! Predicates render to a parameterised `WHERE` fragment with PostgreSQL-style
//! numbered placeholders (`$1`, `$2`, ...). Literal values never appear in the
//! SQL text; table aliases of parameterised joins are hex-encoded ids.
//!
//! # Invariants
//! - Placeholders are numbered in the order their values appear in `params`.
//! - An empty value list never renders as `IN ()`: it renders as `FALSE`
//!   (or `TRUE` when negated).

use serde::Serialize;

use crate::search::{
    Column, CompiledFilter, Entity, JoinOn, JoinPlan, Literal, Predicate, SubQuery, TextMatch,
};

/// A SQL fragment and its bind values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Literal>,
}

/// Render a predicate as a `WHERE` fragment with placeholders starting at `$1`.
#[must_use]
pub fn render_predicate(predicate: &Predicate) -> SqlFragment {
    render_predicate_with_offset(predicate, 0)
}

/// Render a predicate with placeholders starting after `start_offset`.
///
/// Useful when the fragment is appended to a statement that already binds
/// `start_offset` values.
#[must_use]
pub fn render_predicate_with_offset(predicate: &Predicate, start_offset: usize) -> SqlFragment {
    let mut renderer = Renderer::new(start_offset);
    let sql = renderer.predicate(predicate);
    renderer.finish(sql)
}

/// Assemble `SELECT <id> FROM <root> <joins> WHERE <predicate>`.
///
/// The statement selects ids only; it exists to show exactly what a compiled
/// filter asks of the database.
#[must_use]
pub fn render_select(entity: Entity, filter: &CompiledFilter) -> SqlFragment {
    let mut renderer = Renderer::new(0);
    let root = entity.root_table();
    let mut sql = format!(
        "SELECT {} FROM {} {}",
        column(&entity.id_column()),
        root.sql_name(),
        root.alias()
    );
    let joins = renderer.joins(entity, filter);
    if !joins.is_empty() {
        sql.push(' ');
        sql.push_str(&joins);
    }
    if filter.predicate != Predicate::True {
        let predicate = renderer.predicate(&filter.predicate);
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
    }
    renderer.finish(sql)
}

struct Renderer {
    offset: usize,
    params: Vec<Literal>,
}

impl Renderer {
    const fn new(offset: usize) -> Self {
        Self {
            offset,
            params: Vec::new(),
        }
    }

    fn finish(self, sql: String) -> SqlFragment {
        SqlFragment {
            sql,
            params: self.params,
        }
    }

    fn bind(&mut self, value: Literal) -> String {
        self.params.push(value);
        format!("${}", self.offset + self.params.len())
    }

    fn joins(&mut self, entity: Entity, filter: &CompiledFilter) -> String {
        let mut clauses = Vec::with_capacity(filter.required_joins.len());
        for join in &filter.required_joins {
            let Some(plan) = join.plan(entity) else {
                tracing::warn!(?join, ?entity, "join does not apply to entity, skipped");
                continue;
            };
            clauses.push(self.join(&plan));
        }
        clauses.join(" ")
    }

    fn join(&mut self, plan: &JoinPlan) -> String {
        let on: Vec<String> = plan
            .on
            .iter()
            .map(|on| match on {
                JoinOn::Columns { parent, child } => {
                    format!("{} = {}", column(parent), column(child))
                }
                JoinOn::Value { child, value } => {
                    format!("{} = {}", column(child), self.bind(value.clone()))
                }
            })
            .collect();
        format!(
            "LEFT JOIN {} {} ON {}",
            plan.table.sql_name(),
            plan.table.alias(),
            on.join(" AND ")
        )
    }

    fn predicate(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::True => "TRUE".to_owned(),
            Predicate::False => "FALSE".to_owned(),
            Predicate::And(parts) => self.group(parts, " AND ", "TRUE"),
            Predicate::Or(parts) => self.group(parts, " OR ", "FALSE"),
            Predicate::Compare {
                column: col,
                op,
                value,
            } => format!(
                "{} {} {}",
                column(col),
                op.sql(),
                self.bind(value.clone())
            ),
            Predicate::CompareColumns { left, op, right } => {
                format!("{} {} {}", column(left), op.sql(), column(right))
            }
            Predicate::Text {
                column: col,
                mode,
                value,
                negated,
            } => self.text(col, *mode, value, *negated),
            Predicate::IsNull(col) => format!("{} IS NULL", column(col)),
            Predicate::IsNotNull(col) => format!("{} IS NOT NULL", column(col)),
            Predicate::IsTrue(col) => format!("{} IS TRUE", column(col)),
            Predicate::IsFalse(col) => format!("{} IS FALSE", column(col)),
            Predicate::InList {
                column: col,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated { "TRUE" } else { "FALSE" }.to_owned();
                }
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| self.bind(value.clone()))
                    .collect();
                format!(
                    "{} {} ({})",
                    column(col),
                    if *negated { "NOT IN" } else { "IN" },
                    placeholders.join(", ")
                )
            }
            Predicate::InSubquery {
                column: col,
                subquery,
                negated,
            } => format!(
                "{} {} ({})",
                column(col),
                if *negated { "NOT IN" } else { "IN" },
                self.subquery(subquery)
            ),
        }
    }

    fn group(&mut self, parts: &[Predicate], separator: &str, empty: &str) -> String {
        match parts {
            [] => empty.to_owned(),
            [single] => self.predicate(single),
            _ => {
                let rendered: Vec<String> = parts.iter().map(|part| self.predicate(part)).collect();
                format!("({})", rendered.join(separator))
            }
        }
    }

    fn text(&mut self, col: &Column, mode: TextMatch, value: &str, negated: bool) -> String {
        let (operator, pattern) = match mode {
            TextMatch::Equals => (if negated { "<>" } else { "=" }, value.to_owned()),
            TextMatch::Contains => (like(negated), format!("%{}%", escape_like(value))),
            TextMatch::StartsWith => (like(negated), format!("{}%", escape_like(value))),
            TextMatch::EndsWith => (like(negated), format!("%{}", escape_like(value))),
        };
        let placeholder = self.bind(Literal::Text(pattern));
        let escape = if matches!(mode, TextMatch::Equals) {
            ""
        } else {
            r" ESCAPE '\'"
        };
        format!(
            "LOWER({}) {operator} LOWER({placeholder}){escape}",
            column(col)
        )
    }

    fn subquery(&mut self, subquery: &SubQuery) -> String {
        let table = &subquery.select.table;
        let mut sql = format!(
            "SELECT {} FROM {} {}",
            column(&subquery.select),
            table.sql_name(),
            table.alias()
        );
        if *subquery.filter != Predicate::True {
            sql.push_str(" WHERE ");
            let filter = self.predicate(&subquery.filter);
            sql.push_str(&filter);
        }
        sql
    }
}

const fn like(negated: bool) -> &'static str {
    if negated { "NOT LIKE" } else { "LIKE" }
}

fn column(column: &Column) -> String {
    format!("{}.{}", column.table.alias(), column.name)
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::{book, book_metadata, book_metadata_tag, media, read_progress};
    use crate::search::{Comparison, JoinSet, RequiredJoin};
    use crate::types::{ReadListId, UserId};

    #[test]
    fn test_placeholders_follow_offset() {
        let library = Predicate::eq(book::LIBRARY_ID, "lib");
        let number = Predicate::compare(book_metadata::NUMBER_SORT, Comparison::Gt, 2.5_f32);
        let fragment = render_predicate_with_offset(&library.and(number), 3);
        assert_eq!(fragment.sql, "(b.LIBRARY_ID = $4 AND d.NUMBER_SORT > $5)");
        assert_eq!(
            fragment.params,
            vec![Literal::from("lib"), Literal::Float(2.5)]
        );
    }

    #[test]
    fn test_like_patterns_are_escaped() {
        let predicate = Predicate::text(book_metadata::TITLE, TextMatch::Contains, "100%_a", true);
        let fragment = render_predicate(&predicate);
        assert_eq!(
            fragment.sql,
            r"LOWER(d.TITLE) NOT LIKE LOWER($1) ESCAPE '\'"
        );
        assert_eq!(fragment.params, vec![Literal::from(r"%100\%\_a%")]);
    }

    #[test]
    fn test_case_insensitive_equality() {
        let predicate = Predicate::text(book_metadata::TITLE, TextMatch::Equals, "Dune", false);
        assert_eq!(
            render_predicate(&predicate).sql,
            "LOWER(d.TITLE) = LOWER($1)"
        );
    }

    #[test]
    fn test_empty_in_list_never_renders() {
        let empty = |negated| Predicate::InList {
            column: media::MEDIA_TYPE,
            values: Vec::new(),
            negated,
        };
        assert_eq!(render_predicate(&empty(false)).sql, "FALSE");
        assert_eq!(render_predicate(&empty(true)).sql, "TRUE");
    }

    #[test]
    fn test_sub_query_rendering() {
        let predicate = Predicate::not_in_subquery(
            book::ID,
            SubQuery::new(
                book_metadata_tag::BOOK_ID,
                Predicate::text(book_metadata_tag::TAG, TextMatch::Equals, "horror", false),
            ),
        );
        assert_eq!(
            render_predicate(&predicate).sql,
            "b.ID NOT IN (SELECT bmt.BOOK_ID FROM BOOK_METADATA_TAG bmt \
             WHERE LOWER(bmt.TAG) = LOWER($1))"
        );
    }

    #[test]
    fn test_select_binds_join_values_before_predicate() {
        let user = UserId::new("u1");
        let joins = [RequiredJoin::BookMetadata, RequiredJoin::ReadProgress(user)];
        let filter = CompiledFilter {
            predicate: Predicate::IsTrue(read_progress::COMPLETED),
            required_joins: JoinSet::from(joins),
        };
        let fragment = render_select(Entity::Book, &filter);
        assert_eq!(
            fragment.sql,
            "SELECT b.ID FROM BOOK b \
             LEFT JOIN BOOK_METADATA d ON b.ID = d.BOOK_ID \
             LEFT JOIN READ_PROGRESS r ON b.ID = r.BOOK_ID AND r.USER_ID = $1 \
             WHERE r.COMPLETED IS TRUE"
        );
        assert_eq!(fragment.params, vec![Literal::from("u1")]);
    }

    #[test]
    fn test_read_list_join_alias_is_parameterised() {
        let read_list = RequiredJoin::ReadList(ReadListId::new("a"));
        let filter = CompiledFilter::with_join(Predicate::True, read_list);
        let fragment = render_select(Entity::Book, &filter);
        assert_eq!(
            fragment.sql,
            "SELECT b.ID FROM BOOK b \
             LEFT JOIN READLIST_BOOK rlb_61 ON b.ID = rlb_61.BOOK_ID AND rlb_61.READLIST_ID = $1"
        );
    }

    #[test]
    fn test_inapplicable_join_is_skipped() {
        let filter = CompiledFilter::with_join(Predicate::False, RequiredJoin::Media);
        assert_eq!(
            render_select(Entity::Series, &filter).sql,
            "SELECT s.ID FROM SERIES s WHERE FALSE"
        );
    }
}
