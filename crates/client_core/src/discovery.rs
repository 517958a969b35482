//! Root-resource discovery through RFC 8288 `Link` headers.

use reqwest::{header::LINK, Client};
use shared::protocol::{INDEX_LINK_REL, PREDICT_LINK_REL};
use tracing::{debug, info};
use url::Url;

use crate::{
    error::RequestFailed,
    prediction::{check_status, parse_url},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub target: String,
    pub rels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceLinks {
    pub index: Option<Url>,
    pub predict: Option<Url>,
}

pub async fn discover(http: &Client, root_url: &str) -> Result<ServiceLinks, RequestFailed> {
    let root = parse_url(root_url)?;
    let response = check_status(http.get(root.clone()).send().await?).await?;

    let mut entries = Vec::new();
    for value in response.headers().get_all(LINK) {
        match value.to_str() {
            Ok(raw) => entries.extend(parse_link_header(raw)),
            Err(_) => debug!("skipping non-ascii Link header"),
        }
    }

    let links = resolve_links(&root, &entries);
    info!(
        root = %root,
        predict = ?links.predict.as_ref().map(Url::as_str),
        "discovered service links"
    );
    Ok(links)
}

pub fn resolve_links(root: &Url, entries: &[LinkEntry]) -> ServiceLinks {
    let find = |rel: &str| {
        entries
            .iter()
            .find(|entry| entry.rels.iter().any(|r| r.eq_ignore_ascii_case(rel)))
            .and_then(|entry| root.join(&entry.target).ok())
    };
    ServiceLinks {
        index: find(INDEX_LINK_REL),
        predict: find(PREDICT_LINK_REL),
    }
}

/// Parses one `Link` header value, which may hold several comma-separated links.
pub fn parse_link_header(raw: &str) -> Vec<LinkEntry> {
    split_links(raw)
        .into_iter()
        .filter_map(|link| {
            let link = link.trim();
            let rest = link.strip_prefix('<')?;
            let (target, params) = rest.split_once('>')?;
            let rels = params
                .split(';')
                .filter_map(|param| {
                    let (name, value) = param.split_once('=')?;
                    name.trim()
                        .eq_ignore_ascii_case("rel")
                        .then(|| value.trim().trim_matches('"').to_string())
                })
                .flat_map(|value| {
                    value
                        .split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect();
            Some(LinkEntry {
                target: target.trim().to_string(),
                rels,
            })
        })
        .collect()
}

// Commas inside `<...>` or quoted params do not separate links.
fn split_links(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                parts.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_links_in_one_value() {
        let entries = parse_link_header(
            r#"<http://h:8080/index.html>; rel="index", <http://h:8080/predict>; rel="restconf""#,
        );
        assert_eq!(
            entries,
            vec![
                LinkEntry {
                    target: "http://h:8080/index.html".into(),
                    rels: vec!["index".into()],
                },
                LinkEntry {
                    target: "http://h:8080/predict".into(),
                    rels: vec!["restconf".into()],
                },
            ]
        );
    }

    #[test]
    fn keeps_commas_inside_targets_and_quotes() {
        let entries = parse_link_header(r#"<http://h/a,b>; rel="next restconf"; title="x, y""#);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "http://h/a,b");
        assert_eq!(entries[0].rels, vec!["next", "restconf"]);
    }

    #[test]
    fn skips_garbage_and_resolves_relative_targets() {
        let root = Url::parse("http://svc:9000/").expect("root");
        let mut entries = parse_link_header("not a link");
        assert!(entries.is_empty());
        entries.extend(parse_link_header("</predict>; rel=restconf"));

        let links = resolve_links(&root, &entries);
        assert_eq!(
            links.predict.as_ref().map(Url::as_str),
            Some("http://svc:9000/predict")
        );
        assert_eq!(links.index, None);
    }
}
