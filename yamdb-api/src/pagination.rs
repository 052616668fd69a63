/// List pagination
///
/// Lists answer with one envelope:
///
/// ```json
/// { "count": 42, "next": "/v1/titles/?page=3", "previous": "/v1/titles/", "results": [] }
/// ```
///
/// Two schemes fill it:
///
/// - [`PageNumber`]: `?page=N`, 1-based, fixed page size. A page past the end
///   is a 404; page 1 always exists.
/// - [`LimitOffset`]: `?limit=&offset=`. Without `limit` the whole list is
///   returned.
///
/// `next` and `previous` repeat the request's path and query with only the
/// paging parameters changed.

use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Paginated list envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Converts every result, keeping count and links
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// `?page=` query parameter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

/// `?limit=&offset=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitOffsetParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Page-number window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber {
    page: i64,
    size: i64,
}

impl PageNumber {
    /// Parses `?page=`; absent means page 1
    ///
    /// # Errors
    ///
    /// A page that is not a positive integer is a 404.
    pub fn from_params(params: &PageParams, size: i64) -> ApiResult<Self> {
        let page = match params.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| ApiError::NotFound("Invalid page".to_string()))?,
        };

        Ok(Self {
            page,
            size: size.max(1),
        })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }

    fn num_pages(&self, count: i64) -> i64 {
        (count.saturating_add(self.size - 1) / self.size).max(1)
    }

    /// Rejects pages past the end of a list of `count` items
    pub fn check(&self, count: i64) -> ApiResult<()> {
        if self.page > self.num_pages(count) {
            return Err(ApiError::NotFound("Invalid page".to_string()));
        }
        Ok(())
    }

    /// Wraps one page of results
    pub fn page<T>(&self, uri: &Uri, count: i64, results: Vec<T>) -> Page<T> {
        let next = (self.page < self.num_pages(count))
            .then(|| replace_query_params(uri, &[("page", Some((self.page + 1).to_string()))]));

        let previous = (self.page > 1).then(|| {
            let previous = self.page - 1;
            // Page 1 is the bare URL
            let value = (previous > 1).then(|| previous.to_string());
            replace_query_params(uri, &[("page", value)])
        });

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Limit/offset window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    limit: Option<i64>,
    offset: i64,
}

impl LimitOffset {
    /// Parses `?limit=&offset=`
    ///
    /// Unparsable or non-positive limits are ignored, as are unparsable or
    /// negative offsets.
    pub fn from_params(params: &LimitOffsetParams) -> Self {
        let limit = params
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|l| *l > 0);
        let offset = params
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);

        Self { limit, offset }
    }

    /// `None` means unbounded
    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn page<T>(&self, uri: &Uri, count: i64, results: Vec<T>) -> Page<T> {
        let Some(limit) = self.limit else {
            return Page {
                count,
                next: None,
                previous: None,
                results,
            };
        };

        let next = self
            .offset
            .checked_add(limit)
            .filter(|end| *end < count)
            .map(|end| {
                replace_query_params(
                    uri,
                    &[
                        ("limit", Some(limit.to_string())),
                        ("offset", Some(end.to_string())),
                    ],
                )
            });

        let previous = (self.offset > 0).then(|| {
            let offset = self.offset.saturating_sub(limit);
            let value = (offset > 0).then(|| offset.to_string());
            replace_query_params(
                uri,
                &[("limit", Some(limit.to_string())), ("offset", value)],
            )
        });

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rebuilds `path?query` with the given parameters set (`Some`) or removed
/// (`None`); other parameters keep their order and encoding
fn replace_query_params(uri: &Uri, params: &[(&str, Option<String>)]) -> String {
    let mut pairs: Vec<(String, String)> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .filter(|(k, _)| !params.iter().any(|(name, _)| name == k))
        .collect();

    for (name, value) in params {
        if let Some(value) = value {
            pairs.push((name.to_string(), value.clone()));
        }
    }

    if pairs.is_empty() {
        return uri.path().to_string();
    }

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", uri.path(), query)
}
