//! Aggregation of paginated list responses
//!
//! List endpoints answer with
//! `{"data": [...], "meta": {"pagination": {"current_page", "total_pages", ...}}}`.
//! [`collect_pages`] keeps requesting the next page until the panel reports
//! the last one and returns every `data` item in page order.

use std::future::Future;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::Result;

/// `meta.pagination` block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl Pagination {
    /// Read pagination metadata from a list response, if present
    pub fn from_response(response: &Value) -> Option<Self> {
        let pagination = response.get("meta")?.get("pagination")?;
        Pagination::deserialize(pagination).ok()
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Items of one page; anything other than a `data` array yields none
pub fn page_items(response: &Value) -> Vec<Value> {
    match response.get("data") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Fetch every page through `fetch_page`, starting at page 1.
///
/// The first failure aborts the walk; items gathered before it are dropped.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut items = Vec::new();
    let mut page: u32 = 1;

    loop {
        let response = fetch_page(page).await?;
        let batch = page_items(&response);
        let pagination = Pagination::from_response(&response);

        debug!(
            page,
            items = batch.len(),
            total_pages = pagination.map(|p| p.total_pages),
            "Fetched list page"
        );
        items.extend(batch);

        match pagination {
            Some(pagination) if pagination.has_more() => page += 1,
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ErrorKind};
    use serde_json::json;
    use std::sync::Mutex;

    fn page(items: Vec<Value>, current: u64, total: u64) -> Value {
        json!({
            "object": "list",
            "data": items,
            "meta": {"pagination": {"current_page": current, "total_pages": total, "total": 0, "per_page": 50}}
        })
    }

    #[tokio::test]
    async fn test_walks_all_pages_in_order() {
        let requested = Mutex::new(Vec::new());

        let items = collect_pages(|n| {
            requested.lock().unwrap().push(n);
            async move {
                Ok(page(
                    vec![json!(format!("p{}-a", n)), json!(format!("p{}-b", n))],
                    n as u64,
                    3,
                ))
            }
        })
        .await
        .unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            items,
            vec![
                json!("p1-a"), json!("p1-b"),
                json!("p2-a"), json!("p2-b"),
                json!("p3-a"), json!("p3-b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_pagination_meta_stops_after_one_request() {
        let requested = Mutex::new(0);

        let items = collect_pages(|_| {
            *requested.lock().unwrap() += 1;
            async { Ok(json!({"data": [{"id": 1}]})) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.lock().unwrap(), 1);
        assert_eq!(items, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let items = collect_pages(|_| async { Ok(page(vec![], 1, 1)) }).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let result = collect_pages(|n| async move {
            if n == 2 {
                Err(Error::new(ErrorKind::Remote, "HTTP 500 error").with_status(500))
            } else {
                Ok(page(vec![json!(n)], n as u64, 3))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.message, "HTTP 500 error");
    }

    #[test]
    fn test_pagination_parsing() {
        let response = page(vec![], 2, 5);
        let pagination = Pagination::from_response(&response).unwrap();
        assert_eq!(pagination.current_page, 2);
        assert_eq!(pagination.total_pages, 5);
        assert!(pagination.has_more());

        assert!(Pagination::from_response(&json!({"data": []})).is_none());
        assert!(!Pagination::from_response(&page(vec![], 5, 5)).unwrap().has_more());
    }
}
