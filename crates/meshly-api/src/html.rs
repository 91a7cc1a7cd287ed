// Tolerant HTML distillation for the legacy dashboard.
//
// The dashboard renders node and user data as plain HTML tables, so this
// module does narrow, forgiving extraction: locate an element by id, walk
// its rows, and collect the text fragments of each cell. Anything absent
// or malformed yields an empty result rather than an error -- a network
// with zero spare nodes simply renders no `<select>` at all, and blank
// separator rows carry no cells.
//
// Scanning is case-insensitive on tag names and deliberately does not
// attempt full HTML parsing; the dashboard markup is machine-generated
// and flat.

/// A table row: one list of text fragments per cell. A cell can contain
/// several text nodes (e.g. a name plus a comment) and keeps them as
/// separate fragments.
pub type Row = Vec<Vec<String>>;

/// Extract the rows of the table with the given `id` attribute.
///
/// Returns an empty vec if the table is absent. Rows that yield zero
/// cells (blank separator rows) are skipped silently.
pub fn table_rows(html: &str, id: &str) -> Vec<Row> {
    let Some(table) = element_inner(html, "table", id) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for tr in blocks(table, "tr") {
        let cells: Row = blocks(tr, "td").map(text_fragments).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

/// Extract the option texts of the `<select>` with the given `id`.
///
/// Returns an empty vec if the select is absent -- callers must tolerate
/// empty extraction.
pub fn select_options(html: &str, id: &str) -> Vec<String> {
    let Some(select) = element_inner(html, "select", id) else {
        return Vec::new();
    };

    blocks(select, "option")
        .map(|o| text_fragments(o).join(" "))
        .filter(|t| !t.is_empty())
        .collect()
}

// ── Scanning helpers ─────────────────────────────────────────────────

fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Find the inner content of the first `<tag ... id="id">...</tag>`.
fn element_inner<'a>(html: &'a str, tag: &str, id: &str) -> Option<&'a str> {
    let lc = to_lower(html);
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut from = 0;
    while let Some(rel) = lc.get(from..)?.find(&open) {
        let start = from + rel;
        let open_end = lc.get(start..)?.find('>')? + start + 1;
        let open_tag = lc.get(start..open_end)?;

        if has_id(open_tag, id) {
            let end_rel = lc.get(open_end..)?.find(&close)?;
            return html.get(open_end..open_end + end_rel);
        }
        from = open_end;
    }
    None
}

/// Whether an opening-tag slice carries `id="<id>"` (either quote style).
fn has_id(open_tag: &str, id: &str) -> bool {
    let id = to_lower(id);
    open_tag.contains(&format!("id=\"{id}\"")) || open_tag.contains(&format!("id='{id}'"))
}

/// Iterate the inner contents of each `<tag ...>...</tag>` block in order.
fn blocks<'a>(html: &'a str, tag: &'a str) -> impl Iterator<Item = &'a str> {
    let lc = to_lower(html);
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut found = Vec::new();
    let mut from = 0;
    while let Some(rel) = lc.get(from..).and_then(|s| s.find(&open)) {
        let start = from + rel;
        let Some(open_end) = lc.get(start..).and_then(|s| s.find('>')).map(|i| start + i + 1)
        else {
            break;
        };
        let Some(end_rel) = lc.get(open_end..).and_then(|s| s.find(&close)) else {
            break;
        };
        if let Some(inner) = html.get(open_end..open_end + end_rel) {
            found.push(inner);
        }
        from = open_end + end_rel + close.len();
    }
    found.into_iter()
}

/// Collect the non-blank text fragments of a markup snippet: runs of text
/// between tags, whitespace-normalized and entity-decoded.
fn text_fragments(snippet: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut in_tag = false;

    for ch in snippet.chars() {
        match ch {
            '<' => {
                in_tag = true;
                flush(&mut current, &mut fragments);
            }
            '>' => in_tag = false,
            _ if !in_tag => current.push(ch),
            _ => {}
        }
    }
    flush(&mut current, &mut fragments);
    fragments
}

fn flush(current: &mut String, fragments: &mut Vec<String>) {
    let text = normalize_ws(&decode_entities(current));
    if !text.is_empty() {
        fragments.push(text);
    }
    current.clear();
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
