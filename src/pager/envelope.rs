//! List response shape sniffing.
//!
//! The backend answers list requests in four envelope shapes, all kept as
//! a black-box contract: `{content, totalElements, totalPages, pageNumber}`,
//! `{data: {content, ..}}`, `{data: [..]}`, and a bare array. Anything else
//! degrades to an empty list.

#[derive(Debug, Default, PartialEq)]
pub struct ListEnvelope {
    pub items: Vec<serde_json::Value>,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u32>,
    pub page_number: Option<u32>,
}

pub fn sniff(body: serde_json::Value) -> ListEnvelope {
    match body {
        serde_json::Value::Array(items) => ListEnvelope {
            items,
            ..Default::default()
        },
        serde_json::Value::Object(mut map) => {
            if let Some(serde_json::Value::Array(items)) = map.get("content") {
                return ListEnvelope {
                    items: items.clone(),
                    total_elements: map.get("totalElements").and_then(|v| v.as_u64()),
                    total_pages: map
                        .get("totalPages")
                        .and_then(|v| v.as_u64())
                        .map(|v| v as u32),
                    page_number: map
                        .get("pageNumber")
                        .and_then(|v| v.as_u64())
                        .map(|v| v as u32),
                };
            }
            match map.shift_remove("data") {
                Some(inner) => sniff(inner),
                None => ListEnvelope::default(),
            }
        }
        _ => ListEnvelope::default(),
    }
}
