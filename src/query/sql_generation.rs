//! Query builder SQL generation.
//!
//! SQL text and the binding list are produced together by one
//! left-to-right traversal, so the i-th binding always belongs to the
//! i-th `?` placeholder.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;

impl QueryBuilder {
    /// Compile the SELECT statement and its ordered binding list.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut bindings = Vec::new();

        if self.selects.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.selects.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {} {} {}",
                join.kind, join.table, join.left, join.operator, join.right
            ));
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&compile_wheres(&self.wheres, &mut bindings));
        }

        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.groups.join(", "));
        }

        if let Some(having) = &self.having {
            sql.push_str(&format!(" HAVING {} {} ?", having.column, having.operator));
            bindings.push(having.value.clone());
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            let clauses: Vec<String> = self
                .orders
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(&clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, bindings)
    }

    /// Render the statement with bindings substituted into the text.
    /// Debug/logging only, never executed.
    pub fn to_raw_sql(&self) -> String {
        let (sql, bindings) = self.to_sql();
        let mut raw = String::with_capacity(sql.len());
        let mut values = bindings.iter();
        for c in sql.chars() {
            if c == '?' {
                match values.next() {
                    Some(value) => raw.push_str(&format_value(value)),
                    None => raw.push(c),
                }
            } else {
                raw.push(c);
            }
        }
        raw
    }
}

/// Compile one nesting level of WHERE nodes, appending each bound value
/// at the moment its placeholder is emitted. `Nested` recurses, splicing
/// the sub-list's bindings into the parent stream in place.
pub(crate) fn compile_wheres(nodes: &[WhereNode], bindings: &mut Vec<Value>) -> String {
    let mut clauses = Vec::with_capacity(nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        let boolean = if i > 0 {
            format!("{} ", node.boolean())
        } else {
            String::new()
        };

        match node {
            WhereNode::Basic {
                column,
                operator,
                value,
                ..
            } => {
                clauses.push(format!("{}{} {} ?", boolean, column, operator));
                bindings.push(value.clone());
            }
            WhereNode::In { column, values, .. } => {
                if values.is_empty() {
                    // IN () is invalid SQL; an empty key set matches nothing
                    clauses.push(format!("{}1 = 0", boolean));
                } else {
                    clauses.push(format!(
                        "{}{} IN ({})",
                        boolean,
                        column,
                        placeholders(values.len())
                    ));
                    bindings.extend(values.iter().cloned());
                }
            }
            WhereNode::Null { column, .. } => {
                clauses.push(format!("{}{} IS NULL", boolean, column));
            }
            WhereNode::NotNull { column, .. } => {
                clauses.push(format!("{}{} IS NOT NULL", boolean, column));
            }
            WhereNode::Nested { nodes, .. } => {
                clauses.push(format!("{}({})", boolean, compile_wheres(nodes, bindings)));
            }
        }
    }

    clauses.join(" ")
}

/// Comma-joined `?` placeholders: `placeholders(3)` is `"?,?,?"`.
pub(crate) fn placeholders(count: usize) -> String {
    let mut s = String::with_capacity(count * 2);
    for i in 0..count {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}

/// Format a bound value for raw-SQL rendering.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Null => "NULL".to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> QueryBuilder {
        QueryBuilder::table("users").unwrap()
    }

    fn assert_parity(sql: &str, bindings: &[Value]) {
        assert_eq!(
            sql.matches('?').count(),
            bindings.len(),
            "placeholder/binding mismatch in: {}",
            sql
        );
    }

    #[test]
    fn test_default_projection() {
        let (sql, bindings) = users().to_sql();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_chained_and_conditions() {
        let (sql, bindings) = users()
            .where_eq("a", 1)
            .unwrap()
            .where_eq("b", 2)
            .unwrap()
            .to_sql();
        assert!(sql.contains("a = ? AND b = ?"), "got: {}", sql);
        assert_eq!(bindings, vec![json!(1), json!(2)]);
        assert_parity(&sql, &bindings);
    }

    #[test]
    fn test_or_where() {
        let (sql, bindings) = users()
            .where_eq("a", 1)
            .unwrap()
            .or_where("b", 2)
            .unwrap()
            .to_sql();
        assert!(sql.contains("a = ? OR b = ?"), "got: {}", sql);
        assert_eq!(bindings, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_nested_where_binding_order() {
        let (sql, bindings) = users()
            .where_eq("c", 3)
            .unwrap()
            .where_nested(|q| q.where_eq("a", 1)?.or_where("b", 2))
            .unwrap()
            .to_sql();
        assert!(sql.contains("c = ? AND (a = ? OR b = ?)"), "got: {}", sql);
        assert_eq!(bindings, vec![json!(3), json!(1), json!(2)]);
        assert_parity(&sql, &bindings);
    }

    #[test]
    fn test_deeply_nested_where() {
        let (sql, bindings) = users()
            .where_eq("a", 1)
            .unwrap()
            .or_where_nested(|q| {
                q.where_eq("b", 2)?
                    .where_nested(|q| q.where_eq("c", 3)?.or_where("d", 4))
            })
            .unwrap()
            .to_sql();
        assert!(
            sql.contains("a = ? OR (b = ? AND (c = ? OR d = ?))"),
            "got: {}",
            sql
        );
        assert_eq!(bindings, vec![json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_where_in() {
        let (sql, bindings) = users().where_in("id", vec![1, 2, 3]).unwrap().to_sql();
        assert!(sql.contains("id IN (?,?,?)"), "got: {}", sql);
        assert_eq!(bindings, vec![json!(1), json!(2), json!(3)]);
        assert_parity(&sql, &bindings);
    }

    #[test]
    fn test_empty_where_in_matches_nothing() {
        let (sql, bindings) = users()
            .where_in("id", Vec::<i64>::new())
            .unwrap()
            .to_sql();
        assert!(sql.contains("WHERE 1 = 0"), "got: {}", sql);
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_null_conditions_bind_nothing() {
        let (sql, bindings) = users()
            .where_null("deleted_at")
            .unwrap()
            .where_not_null("email")
            .unwrap()
            .to_sql();
        assert!(
            sql.contains("deleted_at IS NULL AND email IS NOT NULL"),
            "got: {}",
            sql
        );
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_full_select_clause_order() {
        let (sql, bindings) = QueryBuilder::table("posts")
            .unwrap()
            .select(&["posts.id", "posts.title"])
            .unwrap()
            .left_join("users", "posts.user_id", "=", "users.id")
            .unwrap()
            .where_eq("posts.status", "publish")
            .unwrap()
            .group_by(&["posts.category_id"])
            .unwrap()
            .having("hits", ">", 100)
            .unwrap()
            .order_by_desc("posts.created_at")
            .unwrap()
            .limit(10)
            .offset(20)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT posts.id, posts.title FROM posts \
             LEFT JOIN users ON posts.user_id = users.id \
             WHERE posts.status = ? \
             GROUP BY posts.category_id \
             HAVING hits > ? \
             ORDER BY posts.created_at DESC \
             LIMIT 10 OFFSET 20"
        );
        assert_eq!(bindings, vec![json!("publish"), json!(100)]);
        assert_parity(&sql, &bindings);
    }

    #[test]
    fn test_to_raw_sql_substitution() {
        let raw = users()
            .where_eq("name", "o'neil")
            .unwrap()
            .where_eq("age", 30)
            .unwrap()
            .where_null("deleted_at")
            .unwrap()
            .to_raw_sql();
        assert_eq!(
            raw,
            "SELECT * FROM users WHERE name = 'o''neil' AND age = 30 AND deleted_at IS NULL"
        );
    }

    #[test]
    fn test_raw_sql_does_not_resubstitute_values() {
        // A bound string containing '?' must not consume later bindings.
        let raw = users()
            .where_eq("question", "why?")
            .unwrap()
            .where_eq("answer", 42)
            .unwrap()
            .to_raw_sql();
        assert_eq!(
            raw,
            "SELECT * FROM users WHERE question = 'why?' AND answer = 42"
        );
    }

    #[test]
    fn test_placeholders_helper() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
        assert_eq!(placeholders(0), "");
    }
}
