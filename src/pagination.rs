use crate::{
    client::{GitLabClient, Query},
    error::{GitLabError, Result},
};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// Largest page size GitLab accepts.
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_PER_PAGE: u32 = 20;

pub const NEXT_PAGE_HEADER: &str = "x-next-page";
pub const TOTAL_HEADER: &str = "x-total";

/// Pagination headers of a single GitLab list response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub next_page: Option<u32>,
    pub total: Option<u64>,
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|v| !v.is_empty())?
        .parse()
        .ok()
}

impl PageInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            next_page: header_number(headers, NEXT_PAGE_HEADER),
            total: header_number(headers, TOTAL_HEADER),
        }
    }
}

/// Checks explicit paging arguments before they are sent.
pub fn validate_paging(page: Option<i64>, per_page: Option<i64>) -> Result<()> {
    if let Some(page) = page
        && page < 1
    {
        return Err(GitLabError::validation("Page number must be 1 or greater"));
    }
    if let Some(per_page) = per_page
        && !(1..=i64::from(MAX_PER_PAGE)).contains(&per_page)
    {
        return Err(GitLabError::validation("Per page must be between 1 and 100"));
    }
    Ok(())
}

/// Adds `page`/`per_page` to `query`, falling back to the first page of
/// `DEFAULT_PER_PAGE` items.
pub fn apply_paging(query: &mut Query, page: Option<i64>, per_page: Option<i64>) -> Result<()> {
    validate_paging(page, per_page)?;
    query.set("page", page.unwrap_or(1));
    query.set("per_page", per_page.unwrap_or(i64::from(DEFAULT_PER_PAGE)));
    Ok(())
}

/// Fetches every page of `endpoint` by following `x-next-page` and returns
/// the items in page order. `per_page` is capped at [`MAX_PER_PAGE`].
pub async fn fetch_all_pages<T: DeserializeOwned>(
    client: &GitLabClient,
    endpoint: &str,
    query: &Query,
    per_page: Option<i64>,
) -> Result<Vec<T>> {
    let per_page = per_page
        .filter(|p| *p > 0)
        .map_or(MAX_PER_PAGE, |p| p.min(i64::from(MAX_PER_PAGE)) as u32);

    let mut query = query.clone();
    query.set("per_page", per_page);

    let mut items = Vec::new();
    let mut page = 1u32;
    loop {
        query.set("page", page);
        let (batch, headers): (Vec<T>, _) = client.get_with_headers(endpoint, &query).await?;
        let info = PageInfo::from_headers(&headers);
        tracing::debug!(
            "Fetched page {page} of {endpoint}: {} items, next page {:?}",
            batch.len(),
            info.next_page
        );
        items.extend(batch);

        match info.next_page {
            Some(next) if next > page => page = next,
            _ => break,
        }
    }

    Ok(items)
}
