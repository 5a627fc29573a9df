use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FetchError, Result};

/// Page-size bounds accepted by the list endpoint
const LIMIT_MIN: i64 = 1;
const LIMIT_MAX: i64 = 100;

/// Bounds on related-content expansion
const DEPTH_MIN: i64 = 0;
const DEPTH_MAX: i64 = 3;

const DEFAULT_LIMIT: i64 = 10;
const DEFAULT_DEPTH: i64 = 1;
const DEFAULT_RICH_EDITOR_FORMAT: &str = "object";

/// Query options for a content-list request
///
/// `Default` carries the canonical values (limit 10, offset 0, depth 1,
/// object-format rich text), so a default query reproduces the standard
/// request. Setting a field to `None` omits the parameter entirely and the
/// remote default applies instead. Out-of-range numeric values are clamped
/// when the pairs are assembled, never rejected.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Page size, clamped into [1, 100]
    pub limit: Option<i64>,
    /// Number of records to skip, clamped to be non-negative
    pub offset: Option<i64>,
    /// Sort expression, e.g. `-publishedAt`
    pub orders: Option<String>,
    /// Full-text search query
    pub q: Option<String>,
    /// Filter expression, e.g. `category[equals]news`
    pub filters: Option<String>,
    /// Comma-separated field projection
    pub fields: Option<String>,
    /// Comma-separated record identifiers
    pub ids: Option<String>,
    /// Related-content expansion depth, clamped into [0, 3]
    pub depth: Option<i64>,
    /// Access token for unpublished revisions
    pub draft_key: Option<String>,
    /// Rich-text representation, `object` or `html`
    pub rich_editor_format: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIMIT),
            offset: Some(0),
            orders: None,
            q: None,
            filters: None,
            fields: None,
            ids: None,
            depth: Some(DEFAULT_DEPTH),
            draft_key: None,
            rich_editor_format: Some(DEFAULT_RICH_EDITOR_FORMAT.to_string()),
        }
    }
}

impl ListQuery {
    /// Assemble the ordered query pairs for the wire.
    ///
    /// Numeric values are clamped into their documented ranges; string
    /// values are trimmed and omitted when empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.clamp(LIMIT_MIN, LIMIT_MAX).to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.max(0).to_string()));
        }
        push_trimmed(&mut pairs, "orders", self.orders.as_deref());
        push_trimmed(&mut pairs, "q", self.q.as_deref());
        push_trimmed(&mut pairs, "filters", self.filters.as_deref());
        push_trimmed(&mut pairs, "fields", self.fields.as_deref());
        push_trimmed(&mut pairs, "ids", self.ids.as_deref());
        if let Some(depth) = self.depth {
            pairs.push(("depth", depth.clamp(DEPTH_MIN, DEPTH_MAX).to_string()));
        }
        push_trimmed(&mut pairs, "draftKey", self.draft_key.as_deref());
        push_trimmed(
            &mut pairs,
            "richEditorFormat",
            self.rich_editor_format.as_deref(),
        );

        pairs
    }
}

/// Query options for a single-record request
///
/// Same clamping and omission rules as [`ListQuery`]; `Default` carries
/// depth 1 and object-format rich text.
#[derive(Debug, Clone)]
pub struct DetailQuery {
    /// Comma-separated field projection
    pub fields: Option<String>,
    /// Related-content expansion depth, clamped into [0, 3]
    pub depth: Option<i64>,
    /// Access token for unpublished revisions
    pub draft_key: Option<String>,
    /// Rich-text representation, `object` or `html`
    pub rich_editor_format: Option<String>,
}

impl Default for DetailQuery {
    fn default() -> Self {
        Self {
            fields: None,
            depth: Some(DEFAULT_DEPTH),
            draft_key: None,
            rich_editor_format: Some(DEFAULT_RICH_EDITOR_FORMAT.to_string()),
        }
    }
}

impl DetailQuery {
    /// Assemble the ordered query pairs for the wire.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        push_trimmed(&mut pairs, "fields", self.fields.as_deref());
        if let Some(depth) = self.depth {
            pairs.push(("depth", depth.clamp(DEPTH_MIN, DEPTH_MAX).to_string()));
        }
        push_trimmed(&mut pairs, "draftKey", self.draft_key.as_deref());
        push_trimmed(
            &mut pairs,
            "richEditorFormat",
            self.rich_editor_format.as_deref(),
        );

        pairs
    }
}

fn push_trimmed(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            pairs.push((key, value.to_string()));
        }
    }
}

/// One decoded page of a content-list response
///
/// Every field tolerates absence: a 200 body missing a key decodes to the
/// zero value, matching the service's sparse responses under projections.
/// `contents.len() <= limit` is expected but remote-controlled and never
/// enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u64,
    /// Records as opaque JSON, in the order the service returned them
    #[serde(default)]
    pub contents: Vec<Value>,
}

impl ContentPage {
    /// Human-readable summary line for a list operation.
    pub fn summary(&self, endpoint: &str) -> String {
        format!(
            "Successfully retrieved {} items from endpoint '{}' (total: {} items, limit: {}, offset: {})",
            self.contents.len(),
            endpoint,
            self.total_count,
            self.limit,
            self.offset
        )
    }

    /// Extract the `id` of every record, in page order.
    ///
    /// Fails when any record lacks a string `id` field; id-projected
    /// listings always carry one.
    pub fn content_ids(&self) -> Result<Vec<String>> {
        self.contents
            .iter()
            .map(|item| {
                item.get("id")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .ok_or_else(|| FetchError::InvalidStructure {
                        message: "list item is missing a string 'id' field".to_string(),
                    })
            })
            .collect()
    }
}

/// Why one record could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFailure {
    pub content_id: String,
    pub error: String,
}

/// Combined result of a full-contents fetch
///
/// Pagination fields echo the listing page. `contents` holds the
/// successfully fetched records in completion order, which under concurrency
/// does not match identifier order. `errors` is omitted from serialized
/// output when no record failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_count: u64,
    pub limit: u32,
    pub offset: u64,
    pub contents: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DetailFailure>,
}

impl AggregateResult {
    /// An aggregate with no fetched records, echoing a page's pagination.
    pub fn empty(page: &ContentPage) -> Self {
        Self {
            total_count: page.total_count,
            limit: page.limit,
            offset: page.offset,
            contents: Vec::new(),
            errors: Vec::new(),
        }
    }
}
