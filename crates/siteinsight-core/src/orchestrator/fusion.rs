//! Outer join of analytics and crawl tables on the page they describe

use crate::answer::{FusedData, SourceKind};
use crate::table::{CellValue, Row, TabularResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lower-cased column names recognised as the page column, in priority order
pub const PAGE_COLUMNS: &[&str] = &[
    "pagepath",
    "pagepathplusquerystring",
    "landingpage",
    "page",
    "address",
    "url",
    "pageurl",
];

/// One page with the fields every source reported for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRecord {
    /// Normalized page key
    pub page: String,
    /// Source-qualified fields, e.g. `analytics.activeUsers`, `seo.Status Code`
    pub fields: BTreeMap<String, CellValue>,
    /// Sources with no row for this page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// One input to [`outer_join`]
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub label: &'a str,
    pub table: &'a TabularResult,
    /// Sum numeric cells when a page appears more than once
    pub sum_duplicates: bool,
}

/// The page column of a table, if it has one
pub fn page_column(table: &TabularResult) -> Option<&str> {
    PAGE_COLUMNS.iter().find_map(|candidate| {
        table
            .columns
            .iter()
            .find(|c| c.to_lowercase() == *candidate)
            .map(String::as_str)
    })
}

/// Reduce a page path or URL to a comparable key.
///
/// Case, scheme, host, query string, fragment and trailing slash are ignored,
/// so `https://Example.com/Blog/` and `/blog` share the key `/blog`.
pub fn normalize_page_key(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();

    let path = match lower.find("://") {
        Some(idx) => {
            let rest = &lower[idx + 3..];
            rest.find('/').map(|p| &rest[p..]).unwrap_or("/")
        }
        None if !lower.starts_with('/') => {
            // `example.com/about` or a bare `about`
            match lower.split_once('/') {
                Some((host, _)) if host.contains('.') => &lower[host.len()..],
                _ => lower.as_str(),
            }
        }
        None => lower.as_str(),
    };

    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Rows of one side grouped by page key
#[derive(Debug, Default)]
struct Keyed {
    rows: BTreeMap<String, Row>,
    /// Rows whose page cell is blank
    pageless: Vec<Row>,
}

/// Key the rows of one side by page.
///
/// A summing side adds numeric cells of repeated pages together. Any other
/// side keeps every repeat under indexed column names (`Status Code#2`)
/// along with its own page cell, so two crawl rows that normalize to the
/// same page both survive.
fn keyed_rows(side: &Side<'_>) -> Option<Keyed> {
    let page_col = page_column(side.table)?;
    let mut keyed = Keyed::default();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    for row in &side.table.rows {
        let raw = match row.get(page_col) {
            Some(cell) if !cell.is_empty() => cell.to_string(),
            _ => {
                keyed.pageless.push(row.clone());
                continue;
            }
        };
        let key = normalize_page_key(&raw);
        let occurrence = seen.entry(key.clone()).or_insert(0);
        *occurrence += 1;

        let fields = row
            .iter()
            .filter(|(col, _)| !side.sum_duplicates || col.as_str() != page_col)
            .map(|(col, v)| (col.clone(), v.clone()));

        match keyed.rows.get_mut(&key) {
            None => {
                keyed.rows.insert(key, fields.collect());
            }
            Some(existing) if side.sum_duplicates => {
                for (col, value) in fields {
                    match existing.get_mut(&col) {
                        Some(CellValue::Number(acc)) => {
                            if let CellValue::Number(n) = value {
                                *acc += n;
                            }
                        }
                        Some(_) => {}
                        None => {
                            existing.insert(col, value);
                        }
                    }
                }
            }
            Some(existing) => {
                for (col, value) in fields {
                    existing.insert(format!("{}#{}", col, occurrence), value);
                }
            }
        }
    }

    Some(keyed)
}

/// Full outer join of two tables on the normalized page key.
///
/// Records come back sorted by key. A side without a page column
/// contributes nothing, and rows with a blank page cell are left out;
/// [`fuse`] passes those through unjoined.
pub fn outer_join(left: Side<'_>, right: Side<'_>) -> Vec<FusedRecord> {
    let sides = [left, right];
    let keyed: Vec<BTreeMap<String, Row>> = sides
        .iter()
        .map(|side| keyed_rows(side).map(|k| k.rows).unwrap_or_default())
        .collect();

    let mut records: BTreeMap<String, FusedRecord> = BTreeMap::new();
    for (side, rows) in sides.iter().zip(&keyed) {
        for key in rows.keys() {
            records.entry(key.clone()).or_insert_with(|| FusedRecord {
                page: key.clone(),
                fields: BTreeMap::new(),
                missing: Vec::new(),
            });
        }
        tracing::debug!("{}: {} distinct pages", side.label, rows.len());
    }

    for record in records.values_mut() {
        for (side, rows) in sides.iter().zip(&keyed) {
            match rows.get(&record.page) {
                Some(row) => {
                    for (col, value) in row {
                        record
                            .fields
                            .insert(format!("{}.{}", side.label, col), value.clone());
                    }
                }
                None => record.missing.push(side.label.to_string()),
            }
        }
        record.missing.sort();
    }

    records.into_values().collect()
}

/// Join an analytics table with a crawl table
pub fn fuse(analytics: &TabularResult, seo: &TabularResult) -> FusedData {
    let analytics_side = Side {
        label: SourceKind::Analytics.as_str(),
        table: analytics,
        sum_duplicates: true,
    };
    let seo_side = Side {
        label: SourceKind::Seo.as_str(),
        table: seo,
        sum_duplicates: false,
    };

    let records = outer_join(analytics_side, seo_side);

    let mut unjoined = BTreeMap::new();
    for side in [analytics_side, seo_side] {
        match keyed_rows(&side) {
            None => {
                tracing::warn!(
                    "{} data has no page column; passing it through unjoined",
                    side.label
                );
                unjoined.insert(side.label.to_string(), side.table.clone());
            }
            Some(keyed) if !keyed.pageless.is_empty() => {
                tracing::warn!(
                    "{}: {} row(s) have no page value; passing them through unjoined",
                    side.label,
                    keyed.pageless.len()
                );
                unjoined.insert(
                    side.label.to_string(),
                    TabularResult::new(side.table.columns.clone(), keyed.pageless),
                );
            }
            Some(_) => {}
        }
    }

    tracing::info!(
        "Fused {} analytics rows with {} crawl rows into {} pages",
        analytics.row_count,
        seo.row_count,
        records.len()
    );

    FusedData::new(records, unjoined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn table(page_col: &str, rows: &[(&str, f64)], value_col: &str) -> TabularResult {
        let rows = rows
            .iter()
            .map(|(page, v)| {
                let mut row = Row::new();
                row.insert(page_col.to_string(), CellValue::from(*page));
                row.insert(value_col.to_string(), CellValue::Number(*v));
                row
            })
            .collect();
        TabularResult::new(vec![page_col.to_string(), value_col.to_string()], rows)
    }

    #[test]
    fn test_normalize_page_key() {
        assert_eq!(normalize_page_key("https://Example.com/Blog/"), "/blog");
        assert_eq!(normalize_page_key("/blog"), "/blog");
        assert_eq!(normalize_page_key("http://example.com"), "/");
        assert_eq!(normalize_page_key("https://example.com/"), "/");
        assert_eq!(normalize_page_key("/products?id=3#top"), "/products");
        assert_eq!(normalize_page_key("www.example.com/about/"), "/about");
        assert_eq!(normalize_page_key("about"), "/about");
        assert_eq!(normalize_page_key(""), "/");
    }

    #[test]
    fn test_page_column_detection() {
        let t = table("Address", &[], "Status Code");
        assert_eq!(page_column(&t), Some("Address"));
        let t = table("pagePath", &[], "activeUsers");
        assert_eq!(page_column(&t), Some("pagePath"));
        let t = table("country", &[], "activeUsers");
        assert_eq!(page_column(&t), None);
    }

    #[test]
    fn test_fuse_matches_urls_with_paths() {
        let analytics = table(
            "pagePath",
            &[("/", 500.0), ("/blog", 300.0), ("/pricing", 50.0)],
            "screenPageViews",
        );
        let seo = table(
            "Address",
            &[
                ("https://example.com/", 200.0),
                ("https://example.com/blog/", 200.0),
                ("https://example.com/about", 404.0),
            ],
            "Status Code",
        );

        let fused = fuse(&analytics, &seo);
        assert_eq!(fused.row_count, 4);
        assert!(fused.unjoined.is_empty());

        let blog = fused.records.iter().find(|r| r.page == "/blog").unwrap();
        assert_eq!(blog.fields["analytics.screenPageViews"], CellValue::Number(300.0));
        assert_eq!(blog.fields["seo.Status Code"], CellValue::Number(200.0));
        assert!(blog.missing.is_empty());

        let about = fused.records.iter().find(|r| r.page == "/about").unwrap();
        assert_eq!(about.missing, vec!["analytics"]);
        let pricing = fused.records.iter().find(|r| r.page == "/pricing").unwrap();
        assert_eq!(pricing.missing, vec!["seo"]);
    }

    #[test]
    fn test_analytics_duplicates_are_summed() {
        let mut analytics = table("pagePath", &[("/a", 10.0), ("/A/", 5.0)], "activeUsers");
        for (i, row) in analytics.rows.iter_mut().enumerate() {
            row.insert("date".into(), CellValue::from(format!("2024030{}", i + 1)));
        }
        analytics.columns.push("date".into());

        let fused = fuse(&analytics, &TabularResult::empty());
        assert_eq!(fused.records.len(), 1);
        let rec = &fused.records[0];
        assert_eq!(rec.fields["analytics.activeUsers"], CellValue::Number(15.0));
        assert_eq!(rec.fields["analytics.date"], CellValue::from("20240301"));
    }

    #[test]
    fn test_crawl_rows_for_the_same_page_are_all_kept() {
        let seo = table(
            "Address",
            &[
                ("http://example.com/about", 301.0),
                ("https://example.com/about/", 404.0),
            ],
            "Status Code",
        );

        let fused = fuse(&TabularResult::empty(), &seo);
        assert_eq!(fused.records.len(), 1);
        let about = &fused.records[0];
        assert_eq!(about.page, "/about");
        assert_eq!(about.fields["seo.Status Code"], CellValue::Number(301.0));
        assert_eq!(about.fields["seo.Status Code#2"], CellValue::Number(404.0));
        assert_eq!(
            about.fields["seo.Address#2"],
            CellValue::from("https://example.com/about/")
        );
        assert_eq!(about.missing, vec!["analytics"]);
    }

    #[test]
    fn test_rows_without_a_page_are_passed_through() {
        let mut seo = table(
            "Address",
            &[("https://example.com/x", 200.0), ("", 500.0)],
            "Status Code",
        );
        seo.rows[1].remove("Address");

        let fused = fuse(&TabularResult::empty(), &seo);
        assert_eq!(fused.records.len(), 1);
        let pageless = &fused.unjoined["seo"];
        assert_eq!(pageless.row_count, 1);
        assert_eq!(pageless.rows[0]["Status Code"], CellValue::Number(500.0));
        assert_eq!(pageless.columns, seo.columns);
    }

    #[test]
    fn test_table_without_page_column_is_passed_through() {
        let analytics = table("country", &[("US", 10.0)], "activeUsers");
        let seo = table("Address", &[("https://example.com/x", 200.0)], "Status Code");
        let fused = fuse(&analytics, &seo);
        assert_eq!(fused.records.len(), 1);
        assert_eq!(fused.records[0].missing, vec!["analytics"]);
        assert!(fused.unjoined.contains_key("analytics"));
        assert!(!fused.unjoined.contains_key("seo"));
    }

    fn page_strategy() -> impl Strategy<Value = String> {
        let paths = prop::sample::select(vec!["/", "/blog", "/about", "/pricing", "/docs/api"]);
        let forms = prop::sample::select(vec![0u8, 1, 2, 3]);
        (paths, forms).prop_map(|(path, form)| match form {
            0 => path.to_string(),
            1 => path.to_uppercase(),
            2 => format!("https://example.com{}", path),
            _ => format!("{}/", path.trim_end_matches('/')),
        })
    }

    fn table_strategy(page_col: &'static str, value_col: &'static str) -> impl Strategy<Value = TabularResult> {
        prop::collection::vec((page_strategy(), 0u32..1000), 0..12).prop_map(move |rows| {
            let rows = rows
                .into_iter()
                .map(|(page, v)| {
                    let mut row = Row::new();
                    row.insert(page_col.to_string(), CellValue::from(page));
                    row.insert(value_col.to_string(), CellValue::Number(v as f64));
                    row
                })
                .collect();
            TabularResult::new(vec![page_col.to_string(), value_col.to_string()], rows)
        })
    }

    proptest! {
        #[test]
        fn prop_join_is_commutative(
            a in table_strategy("pagePath", "sessions"),
            b in table_strategy("Address", "Status Code"),
        ) {
            let left = Side { label: "analytics", table: &a, sum_duplicates: true };
            let right = Side { label: "seo", table: &b, sum_duplicates: false };

            let ab = outer_join(left, right);
            let ba = outer_join(right, left);

            let keys_ab: BTreeSet<_> = ab.iter().map(|r| r.page.clone()).collect();
            let keys_ba: BTreeSet<_> = ba.iter().map(|r| r.page.clone()).collect();
            prop_assert_eq!(&keys_ab, &keys_ba);

            let expected: BTreeSet<_> = a.rows.iter().chain(b.rows.iter())
                .filter_map(|row| row.get("pagePath").or_else(|| row.get("Address")))
                .map(|cell| normalize_page_key(&cell.to_string()))
                .collect();
            prop_assert_eq!(&keys_ab, &expected);

            // Qualified names make the records identical whichever side comes first
            prop_assert_eq!(ab, ba);
        }
    }
}
