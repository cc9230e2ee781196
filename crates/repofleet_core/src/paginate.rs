use anyhow::{Context, Result, bail};
use serde_json::{Deserializer, Value};
use tracing::debug;

use crate::gh::{ApiRequest, GhApi, Invocation};

/// Page length that signals more pages may follow.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    /// Request `page=1, 2, …` until a short or empty page.
    #[default]
    PageLoop,
    /// One `gh api --paginate` call whose output may hold several JSON values.
    AutoPaginate,
}

/// Fetch every page of `endpoint` and merge them into one value.
///
/// An endpoint that answers with a single object is returned unmodified.
pub fn fetch_collection<A: GhApi + ?Sized>(
    api: &A,
    endpoint: &str,
    mode: PaginationMode,
) -> Result<Value> {
    match mode {
        PaginationMode::PageLoop => fetch_page_loop(api, endpoint),
        PaginationMode::AutoPaginate => {
            let mut request = ApiRequest::get(endpoint);
            request.paginate = true;
            let stdout = fetch_raw(api, request)?;
            merge_json_stream(&stdout)
        }
    }
}

/// One plain GET for endpoints that answer with a single document.
pub fn fetch_document<A: GhApi + ?Sized>(api: &A, endpoint: &str) -> Result<Value> {
    let stdout = fetch_raw(api, ApiRequest::get(endpoint))?;
    serde_json::from_str(&stdout).with_context(|| format!("failed to decode {endpoint}"))
}

fn fetch_page_loop<A: GhApi + ?Sized>(api: &A, endpoint: &str) -> Result<Value> {
    let mut items = Vec::new();
    let mut page = 1usize;

    loop {
        let stdout = fetch_raw(api, ApiRequest::get(with_page(endpoint, page)))?;
        let parsed: Value = serde_json::from_str(&stdout)
            .with_context(|| format!("failed to decode page {page} of {endpoint}"))?;

        let chunk = match parsed {
            Value::Array(chunk) => chunk,
            other if page == 1 => return Ok(other),
            _ => bail!("page {page} of {endpoint} is not a list"),
        };
        if chunk.is_empty() {
            break;
        }

        let short_page = chunk.len() < PAGE_SIZE;
        items.extend(chunk);
        debug!(endpoint = %endpoint, page, collected = items.len(), "fetched page");
        if short_page {
            break;
        }
        page += 1;
    }

    Ok(Value::Array(items))
}

fn fetch_raw<A: GhApi + ?Sized>(api: &A, request: ApiRequest) -> Result<String> {
    let output = api.run(&Invocation::Api(request))?;
    if !output.success() {
        bail!("{}", output.error_text());
    }
    Ok(output.stdout)
}

/// Append the page number with `?` or `&` depending on the existing query.
pub fn with_page(endpoint: &str, page: usize) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}page={page}")
}

/// Decode a stream of concatenated JSON values one at a time.
///
/// List values are flattened into the result and object values appended as
/// single items. A stream holding exactly one non-list value is returned as-is.
pub fn merge_json_stream(text: &str) -> Result<Value> {
    let mut chunks = Vec::new();
    let mut cursor = 0usize;

    loop {
        let rest = &text[cursor..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        cursor += rest.len() - trimmed.len();

        let mut values = Deserializer::from_str(trimmed).into_iter::<Value>();
        let value = match values.next() {
            Some(value) => {
                value.with_context(|| format!("invalid JSON value at byte {cursor}"))?
            }
            None => break,
        };
        cursor += values.byte_offset();
        chunks.push(value);
    }

    if chunks.len() == 1 && !chunks[0].is_array() {
        return Ok(chunks.remove(0));
    }

    let mut merged = Vec::new();
    for chunk in chunks {
        match chunk {
            Value::Array(items) => merged.extend(items),
            other => merged.push(other),
        }
    }
    Ok(Value::Array(merged))
}
