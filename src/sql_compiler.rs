//! SQL compiler that turns a query descriptor into the listing SQL using sea-query.
//!
//! The listing endpoint receives `{ ...descriptor, sortBys, page, size }`;
//! this module compiles that request into the SELECT the backend runs:
//! free-text predicates become `LIKE` clauses, exact-match predicates
//! become `=` or `IN`, date predicates become range bounds, and the page
//! window becomes `LIMIT`/`OFFSET`.

use crate::search::{DatePredicate, FieldPredicate, QueryDescriptor, SortBy, SortDirection};
use sea_query::{Asterisk, Expr, Iden, Order, PostgresQueryBuilder, SelectStatement, SimpleExpr, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Table identifier resolved from the entity mapping
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Compiler configuration
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Maps entity names to table names for schema resolution
    pub table_mapping: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// The listing request shape the search endpoint accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    #[serde(flatten)]
    pub descriptor: QueryDescriptor,
    pub sort_bys: Vec<SortBy>,
    /// 1-based page index
    pub page: u64,
    pub size: u64,
}

/// Compiles listing requests into SQL for a configured entity schema.
pub struct SqlCompiler {
    config: CompilerConfig,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self {
            config: CompilerConfig::default(),
        }
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Get the actual table name for an entity
    fn table_name(&self, entity: &str) -> String {
        self.config
            .table_mapping
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }

    /// Compile a listing request against the given entity into SQL.
    pub fn compile(&self, request: &ListingRequest, entity: &str) -> Result<String, CompileError> {
        let mut select = SelectStatement::new();
        select.from(TableName(self.table_name(entity)));
        select.column(Asterisk);

        let descriptor = &request.descriptor;
        if !descriptor.is_empty() {
            select.and_where(self.compile_descriptor(descriptor)?);
        }

        for sort in &request.sort_bys {
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            select.order_by(ColumnName(column_name(&sort.key)), order);
        }

        select.limit(request.size);
        select.offset(request.page.saturating_sub(1) * request.size);

        Ok(select.to_string(PostgresQueryBuilder))
    }

    /// Compile the three predicate groups into one AND-combined expression.
    fn compile_descriptor(&self, descriptor: &QueryDescriptor) -> Result<SimpleExpr, CompileError> {
        let mut conditions = Vec::new();
        for predicate in &descriptor.search_bys {
            conditions.push(compile_search(predicate)?);
        }
        for predicate in &descriptor.filter_bys {
            conditions.push(compile_filter(predicate)?);
        }
        for predicate in &descriptor.date_bys {
            conditions.extend(compile_date(predicate)?);
        }
        Ok(combine_conditions_with_and(conditions))
    }
}

impl Default for SqlCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-text predicate: OR of `LIKE '%value%'` over the values.
fn compile_search(predicate: &FieldPredicate) -> Result<SimpleExpr, CompileError> {
    let mut conditions = Vec::new();
    for value in &predicate.values {
        let text = match value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            other => {
                return Err(CompileError::new(format!(
                    "search value for field {} is not a scalar: {}",
                    predicate.key, other
                )))
            }
        };
        conditions.push(
            Expr::col(ColumnName(column_name(&predicate.key))).like(format!("%{}%", text)),
        );
    }
    Ok(combine_conditions_with_or(conditions))
}

/// Exact-match predicate: `=` for a single value, `IN` for several.
fn compile_filter(predicate: &FieldPredicate) -> Result<SimpleExpr, CompileError> {
    let col = Expr::col(ColumnName(column_name(&predicate.key)));
    let values: Vec<Value> = predicate
        .values
        .iter()
        .map(|v| json_to_value(&predicate.key, v))
        .collect::<Result<Vec<_>, _>>()?;
    match values.len() {
        0 => Ok(Expr::val(true).into()),
        1 => Ok(col.eq(values.into_iter().next().unwrap())),
        _ => Ok(col.is_in(values)),
    }
}

/// Date predicate: partial `>=` / `<=` bounds; an open range compiles to nothing.
fn compile_date(predicate: &DatePredicate) -> Result<Vec<SimpleExpr>, CompileError> {
    let mut conditions = Vec::new();
    if let Some(begin) = &predicate.begin_time {
        let value = json_to_value(&predicate.key, begin)?;
        conditions.push(Expr::col(ColumnName(column_name(&predicate.key))).gte(value));
    }
    if let Some(end) = &predicate.end_time {
        let value = json_to_value(&predicate.key, end)?;
        conditions.push(Expr::col(ColumnName(column_name(&predicate.key))).lte(value));
    }
    Ok(conditions)
}

/// Combine multiple conditions with AND
fn combine_conditions_with_and(conditions: Vec<SimpleExpr>) -> SimpleExpr {
    if conditions.is_empty() {
        return Expr::val(true).into();
    }
    conditions.into_iter().reduce(|acc, expr| acc.and(expr)).unwrap()
}

/// Combine multiple conditions with OR
fn combine_conditions_with_or(conditions: Vec<SimpleExpr>) -> SimpleExpr {
    if conditions.is_empty() {
        return Expr::val(true).into();
    }
    conditions.into_iter().reduce(|acc, expr| acc.or(expr)).unwrap()
}

/// Convert a JSON form value to a sea-query Value
fn json_to_value(key: &str, value: &JsonValue) -> Result<Value, CompileError> {
    match value {
        JsonValue::String(s) => Ok(Value::String(Some(Box::new(s.clone())))),
        JsonValue::Bool(b) => Ok(Value::Bool(Some(*b))),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::BigInt(Some(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Double(Some(f)))
            } else {
                Err(CompileError::new(format!(
                    "numeric value for field {} is out of range: {}",
                    key, n
                )))
            }
        }
        other => Err(CompileError::new(format!(
            "value for field {} cannot be compiled into SQL: {}",
            key, other
        ))),
    }
}

/// Form keys arrive camelCase; columns are snake_case (createTime -> create_time).
fn column_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{build_query_descriptor, build_sort_directives, SortColumn};
    use serde_json::json;

    fn create_test_compiler() -> SqlCompiler {
        let mut mapping = HashMap::new();
        mapping.insert("User".to_string(), "sys_user".to_string());
        mapping.insert("Role".to_string(), "sys_role".to_string());
        SqlCompiler::from_config(CompilerConfig {
            table_mapping: mapping,
        })
    }

    fn request(descriptor: QueryDescriptor, sort_bys: Vec<SortBy>) -> ListingRequest {
        ListingRequest {
            descriptor,
            sort_bys,
            page: 1,
            size: 20,
        }
    }

    #[test]
    fn test_role_screen_listing_query() {
        let compiler = create_test_compiler();
        let form = json!({
            "name": "",
            "enable": false,
            "createTime": ["2024-01-01", "2024-01-31"]
        });
        let descriptor =
            build_query_descriptor(form.as_object().unwrap(), &["enable"], &[] as &[&str]);
        let sql = compiler
            .compile(&request(descriptor, vec![]), "Role")
            .unwrap();

        assert!(sql.contains("sys_role"));
        // name 为空串, 不产生任何谓词
        assert!(!sql.contains("name"));
        assert!(sql.contains(r#""enable" = FALSE"#));
        assert!(sql.contains(r#""create_time" >= '2024-01-01'"#));
        assert!(sql.contains(r#""create_time" <= '2024-01-31'"#));
    }

    #[test]
    fn test_search_predicate_compiles_to_like() {
        let compiler = create_test_compiler();
        let form = json!({"username": "张"});
        let descriptor =
            build_query_descriptor(form.as_object().unwrap(), &[] as &[&str], &[] as &[&str]);
        let sql = compiler
            .compile(&request(descriptor, vec![]), "User")
            .unwrap();

        assert!(sql.contains("sys_user"));
        assert!(sql.contains(r#""username" LIKE '%张%'"#));
    }

    #[test]
    fn test_multi_value_filter_compiles_to_in() {
        let compiler = create_test_compiler();
        let descriptor = QueryDescriptor {
            filter_bys: vec![FieldPredicate {
                key: "gender".to_string(),
                values: vec![json!("Male"), json!("Female")],
            }],
            ..Default::default()
        };
        let sql = compiler
            .compile(&request(descriptor, vec![]), "User")
            .unwrap();
        assert!(sql.contains(r#""gender" IN ('Male', 'Female')"#));
    }

    #[test]
    fn test_sort_and_page_window() {
        let compiler = create_test_compiler();
        let sort = SortColumn {
            prop: Some("updateTime".to_string()),
            order: Some("descending".to_string()),
        };
        let request = ListingRequest {
            descriptor: QueryDescriptor::default(),
            sort_bys: build_sort_directives(&sort),
            page: 3,
            size: 10,
        };
        let sql = compiler.compile(&request, "User").unwrap();

        assert!(sql.contains(r#"ORDER BY "update_time" DESC"#));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 20"));
    }

    #[test]
    fn test_unmapped_entity_falls_back_to_lowercase() {
        let compiler = create_test_compiler();
        let sql = compiler
            .compile(&request(QueryDescriptor::default(), vec![]), "Organization")
            .unwrap();
        assert!(sql.contains("organization"));
    }

    #[test]
    fn test_nested_value_is_a_compile_error() {
        let compiler = create_test_compiler();
        let descriptor = QueryDescriptor {
            filter_bys: vec![FieldPredicate {
                key: "enable".to_string(),
                values: vec![json!(["a", "b"])],
            }],
            ..Default::default()
        };
        let result = compiler.compile(&request(descriptor, vec![]), "User");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("enable"));
    }

    #[test]
    fn test_numeric_and_boolean_values() {
        let compiler = create_test_compiler();
        let form = json!({"sort": 0, "enable": true});
        let descriptor =
            build_query_descriptor(form.as_object().unwrap(), &["sort", "enable"], &[] as &[&str]);
        let sql = compiler
            .compile(&request(descriptor, vec![]), "User")
            .unwrap();
        assert!(sql.contains(r#""sort" = 0"#));
        assert!(sql.contains(r#""enable" = TRUE"#));
    }

    #[test]
    fn test_listing_request_wire_shape() {
        let form = json!({"enable": true});
        let descriptor =
            build_query_descriptor(form.as_object().unwrap(), &["enable"], &[] as &[&str]);
        let request = request(descriptor, vec![]);
        let wire = serde_json::to_value(&request).unwrap();

        // 描述符字段与分页/排序平铺在同一层
        assert_eq!(wire["filterBys"][0]["key"], "enable");
        assert_eq!(wire["page"], 1);
        assert_eq!(wire["size"], 20);
        assert!(wire["sortBys"].as_array().unwrap().is_empty());
    }
}
