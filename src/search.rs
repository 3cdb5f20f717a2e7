//! Search-form normalization into the backend query descriptor.
//!
//! Every listing screen submits a flat `key -> value` form. The builder
//! classifies each non-blank field into one of three predicate groups
//! (free-text search, exact match, date range) and turns the table
//! widget's sort event into an ordered directive list. The result is the
//! exact shape the listing endpoint accepts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Date-range fields every screen shares.
pub const DEFAULT_DATE_FIELDS: [&str; 2] = ["createTime", "updateTime"];

/// A free-text or exact-match predicate over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPredicate {
    pub key: String,
    pub values: Vec<Value>,
}

/// A date-range predicate; either bound may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePredicate {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Value>,
}

/// The normalized, backend-facing search criteria.
///
/// A field key lands in at most one of the three groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    #[serde(default)]
    pub search_bys: Vec<FieldPredicate>,
    #[serde(default)]
    pub filter_bys: Vec<FieldPredicate>,
    #[serde(default)]
    pub date_bys: Vec<DatePredicate>,
}

impl QueryDescriptor {
    pub fn is_empty(&self) -> bool {
        self.search_bys.is_empty() && self.filter_bys.is_empty() && self.date_bys.is_empty()
    }
}

/// The sort event payload the table widget emits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortColumn {
    pub prop: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort directive in the listing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub key: String,
    pub direction: SortDirection,
}

/// Classify a search form into the three predicate groups.
///
/// Blank values (empty string, empty array, null, empty object) are
/// dropped; booleans and numbers always count, `false` and `0` included.
/// Membership in `filter_fields` wins over the date-field set. Emission
/// order follows the form's key insertion order.
pub fn build_query_descriptor<F, D>(
    form: &Map<String, Value>,
    filter_fields: &[F],
    extra_date_fields: &[D],
) -> QueryDescriptor
where
    F: AsRef<str>,
    D: AsRef<str>,
{
    let mut descriptor = QueryDescriptor::default();
    for (key, value) in form {
        if is_blank(value) {
            continue;
        }
        if filter_fields.iter().any(|f| f.as_ref() == key.as_str()) {
            descriptor.filter_bys.push(FieldPredicate {
                key: key.clone(),
                values: vec![value.clone()],
            });
        } else if is_date_field(key, extra_date_fields) {
            let (begin, end) = date_bounds(value);
            descriptor.date_bys.push(DatePredicate {
                key: key.clone(),
                begin_time: begin,
                end_time: end,
            });
        } else {
            descriptor.search_bys.push(FieldPredicate {
                key: key.clone(),
                values: vec![value.clone()],
            });
        }
    }
    descriptor
}

/// Convert a single-column sort event into the directive list.
///
/// No sorted column means no directive; any order other than the literal
/// "ascending" maps to DESC.
pub fn build_sort_directives(sort: &SortColumn) -> Vec<SortBy> {
    let Some(prop) = &sort.prop else {
        return Vec::new();
    };
    let direction = match sort.order.as_deref() {
        Some("ascending") => SortDirection::Asc,
        _ => SortDirection::Desc,
    };
    vec![SortBy {
        key: prop.clone(),
        direction,
    }]
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_date_field<D: AsRef<str>>(key: &str, extra_date_fields: &[D]) -> bool {
    DEFAULT_DATE_FIELDS.contains(&key) || extra_date_fields.iter().any(|f| f.as_ref() == key)
}

/// A range shorter than two elements degrades to missing bounds.
fn date_bounds(value: &Value) -> (Option<Value>, Option<Value>) {
    match value {
        Value::Array(bounds) => (bounds.first().cloned(), bounds.get(1).cloned()),
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NO_FIELDS: &[&str] = &[];

    fn form(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let form = form(json!({
            "name": "",
            "remark": null,
            "tags": [],
            "nested": {},
            "authKey": "sys:user"
        }));
        let descriptor = build_query_descriptor(&form, NO_FIELDS, NO_FIELDS);

        assert_eq!(descriptor.search_bys.len(), 1);
        assert_eq!(descriptor.search_bys[0].key, "authKey");
        assert!(descriptor.filter_bys.is_empty());
        assert!(descriptor.date_bys.is_empty());
    }

    #[test]
    fn test_falsy_boolean_and_zero_are_kept() {
        let form = form(json!({"enable": false, "sort": 0}));
        let descriptor = build_query_descriptor(&form, &["enable"], NO_FIELDS);

        assert_eq!(descriptor.filter_bys.len(), 1);
        assert_eq!(descriptor.filter_bys[0].key, "enable");
        assert_eq!(descriptor.filter_bys[0].values, vec![json!(false)]);
        assert_eq!(descriptor.search_bys.len(), 1);
        assert_eq!(descriptor.search_bys[0].values, vec![json!(0)]);
    }

    #[test]
    fn test_classification_matches_role_screen() {
        let form = form(json!({
            "name": "",
            "enable": false,
            "createTime": ["2024-01-01", "2024-01-31"]
        }));
        let descriptor = build_query_descriptor(&form, &["enable"], NO_FIELDS);

        assert!(descriptor.search_bys.is_empty());
        assert_eq!(descriptor.filter_bys.len(), 1);
        assert_eq!(descriptor.filter_bys[0].key, "enable");
        assert_eq!(descriptor.date_bys.len(), 1);
        let date = &descriptor.date_bys[0];
        assert_eq!(date.key, "createTime");
        assert_eq!(date.begin_time, Some(json!("2024-01-01")));
        assert_eq!(date.end_time, Some(json!("2024-01-31")));
    }

    #[test]
    fn test_extra_date_fields_extend_the_default_set() {
        let form = form(json!({"loginTime": ["2024-06-01", "2024-06-30"]}));
        let descriptor = build_query_descriptor(&form, NO_FIELDS, &["loginTime"]);
        assert_eq!(descriptor.date_bys.len(), 1);
        assert_eq!(descriptor.date_bys[0].key, "loginTime");
    }

    #[test]
    fn test_short_date_range_degrades_to_partial_bounds() {
        let form = form(json!({"updateTime": ["2024-03-01"]}));
        let descriptor = build_query_descriptor(&form, NO_FIELDS, NO_FIELDS);
        let date = &descriptor.date_bys[0];
        assert_eq!(date.begin_time, Some(json!("2024-03-01")));
        assert_eq!(date.end_time, None);
    }

    #[test]
    fn test_non_array_date_value_yields_open_range() {
        let form = form(json!({"createTime": "2024-03-01"}));
        let descriptor = build_query_descriptor(&form, NO_FIELDS, NO_FIELDS);
        let date = &descriptor.date_bys[0];
        assert_eq!(date.begin_time, None);
        assert_eq!(date.end_time, None);
    }

    #[test]
    fn test_filter_membership_wins_over_date_membership() {
        // createTime 同时出现在过滤字段里时按过滤字段处理
        let form = form(json!({"createTime": "2024-01-01"}));
        let descriptor = build_query_descriptor(&form, &["createTime"], NO_FIELDS);
        assert!(descriptor.date_bys.is_empty());
        assert_eq!(descriptor.filter_bys.len(), 1);
        assert_eq!(descriptor.filter_bys[0].values, vec![json!("2024-01-01")]);
    }

    #[test]
    fn test_emission_follows_form_insertion_order() {
        let form = form(json!({
            "username": "张",
            "phone": "138",
            "remark": "备注"
        }));
        let descriptor = build_query_descriptor(&form, NO_FIELDS, NO_FIELDS);
        let keys: Vec<_> = descriptor.search_bys.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["username", "phone", "remark"]);
    }

    #[test]
    fn test_sort_ascending() {
        let sort = SortColumn {
            prop: Some("updateTime".to_string()),
            order: Some("ascending".to_string()),
        };
        let directives = build_sort_directives(&sort);
        assert_eq!(
            directives,
            vec![SortBy {
                key: "updateTime".to_string(),
                direction: SortDirection::Asc,
            }]
        );
    }

    #[test]
    fn test_sort_anything_else_is_desc() {
        for order in [Some("descending".to_string()), Some("sideways".to_string()), None] {
            let sort = SortColumn {
                prop: Some("name".to_string()),
                order,
            };
            assert_eq!(build_sort_directives(&sort)[0].direction, SortDirection::Desc);
        }
    }

    #[test]
    fn test_sort_without_prop_is_empty() {
        let sort = SortColumn {
            prop: None,
            order: None,
        };
        assert!(build_sort_directives(&sort).is_empty());
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let form = form(json!({"enable": true, "createTime": ["a", "b"], "name": "菜单"}));
        let descriptor = build_query_descriptor(&form, &["enable"], NO_FIELDS);
        let wire = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(wire["filterBys"][0]["key"], "enable");
        assert_eq!(wire["dateBys"][0]["beginTime"], "a");
        assert_eq!(wire["dateBys"][0]["endTime"], "b");
        assert_eq!(wire["searchBys"][0]["key"], "name");

        let direction = serde_json::to_value(SortDirection::Asc).unwrap();
        assert_eq!(direction, json!("ASC"));
    }
}
