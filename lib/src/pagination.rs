//! Sentinel-aware pagination over SPARQL query results.
//!
//! The remote endpoints cap result sizes, so large results are fetched
//! page-by-page: each page is the base query with an `OFFSET .. LIMIT ..`
//! clause appended textually. An exhausted result set is signalled by one of
//! a fixed set of literal "empty" bodies, one per output format; detection is
//! byte-for-byte, never semantic. Pages are requested strictly sequentially.

use anyhow::Result;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Literal response bodies that mark the end of a paginated result set:
/// nothing at all, a bare CSV or TSV header row, an empty JSON array, the
/// canonical empty SPARQL-JSON object, and the canonical empty SPARQL-XML
/// document.
pub const EMPTY_RESPONSES: [&str; 6] = [
    "",
    "sub,pred,obj\r\n",
    "?sub\t?pred\t?obj\n",
    "[]",
    "{\n  \"head\": {\n    \"link\": [],\n    \"vars\": [\n      \"sub\",\n      \"pred\",\n      \"obj\"\n    ]\n  },\n  \"results\": {\n    \"bindings\": []\n  }\n}",
    "<?xml version=\"1.0\"?>\n<sparql xmlns=\"http://www.w3.org/2005/sparql-results#\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:schemaLocation=\"http://www.w3.org/2007/SPARQL/result.xsd\">\n  <head>\n    <variable name=\"sub\"/>\n    <variable name=\"pred\"/>\n    <variable name=\"obj\"/>\n  </head>\n  <results/>\n</sparql>\n",
];

/// Builds the query for one page by appending `OFFSET`/`LIMIT` to the base
/// query. Purely textual; the base query must not already end in a
/// conflicting solution modifier.
pub fn page_query(query: &str, page: usize, page_size: usize) -> String {
    format!("{query}OFFSET {} LIMIT {}", page_size * page, page_size)
}

/// Returns `true` when a response body is one of the end-of-results
/// sentinels.
pub fn is_empty_page(body: &str) -> bool {
    EMPTY_RESPONSES.contains(&body)
}

/// Drives the sequential pagination loop: requests page 0, 1, 2, ... through
/// `fetch` until the first sentinel body, and returns the non-empty page
/// bodies in order. An immediately-empty first page yields an empty vector,
/// which is a valid outcome rather than an error.
pub fn fetch_all_pages<F>(query: &str, page_size: usize, mut fetch: F) -> Result<Vec<String>>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut pages = Vec::new();
    let mut page = 0;
    loop {
        let body = fetch(&page_query(query, page, page_size))?;
        if is_empty_page(&body) {
            break;
        }
        pages.push(body);
        page += 1;
    }
    Ok(pages)
}

/// Whether an Accept value selects the JSON re-wrapping path of
/// [`reassemble`].
pub fn is_json_accept(accept: &str) -> bool {
    accept == "application/ld+json" || accept == "application/json"
}

/// Reassembles fetched pages into one document. For JSON and JSON-LD each
/// page arrives as its own array; the per-page brackets are stripped and the
/// contents re-wrapped as a single array, comma-separated. Every other
/// format is concatenated with a newline after each page. No pages at all
/// produce the empty document.
pub fn reassemble(pages: &[String], accept: &str) -> String {
    if pages.is_empty() {
        return String::new();
    }
    if is_json_accept(accept) {
        let inner: Vec<&str> = pages.iter().map(|p| strip_array_brackets(p)).collect();
        return format!("[\n{}\n]", inner.join(",\n"));
    }
    let mut out = String::new();
    for page in pages {
        out.push_str(page);
        out.push('\n');
    }
    out
}

fn strip_array_brackets(page: &str) -> &str {
    let trimmed = page.trim();
    let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);
    trimmed.trim_matches('\n')
}
