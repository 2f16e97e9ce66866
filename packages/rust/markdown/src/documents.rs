//! Document metadata extraction for the download card.
//!
//! Two shapes are recognised:
//! - labelled pairs, `Document Name: Lease.pdf` followed later by
//!   `Document URL: https://…` (bold markers and bullets tolerated)
//! - markdown links whose target path ends in a document extension

use std::sync::LazyLock;

use regex::Regex;
use tenantchat_shared::DocumentLink;
use url::Url;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "csv", "txt", "rtf", "odt",
];

static NAME_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:document|file)\s*name\s*:\s*(.+)$").expect("name line regex")
});

static URL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:document\s*url|download\s*url|download\s*link|url|link)\s*:\s*(.+)$")
        .expect("url line regex")
});

static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").expect("markdown link regex")
});

static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s)\]>]+").expect("bare url regex")
});

/// Collect the documents referenced by `text`, de-duplicated by URL.
pub fn extract_documents(text: &str) -> Vec<DocumentLink> {
    let mut docs: Vec<DocumentLink> = Vec::new();
    let mut pending_name: Option<String> = None;

    for raw in text.lines() {
        let line = strip_decoration(raw);

        if let Some(caps) = NAME_LINE_RE.captures(&line) {
            pending_name = Some(caps[1].trim().to_string());
            continue;
        }

        if let Some(caps) = URL_LINE_RE.captures(&line) {
            if let Some(url) = url_in(&caps[1]) {
                let name = pending_name
                    .take()
                    .unwrap_or_else(|| file_name_of(&url));
                push_unique(&mut docs, name, url);
            }
        }
    }

    for caps in MD_LINK_RE.captures_iter(text) {
        let href = &caps[2];
        if has_document_extension(href) {
            push_unique(&mut docs, caps[1].trim().to_string(), href.to_string());
        }
    }

    docs
}

/// Drop list bullets, quote markers, and bold markers around a label line.
fn strip_decoration(line: &str) -> String {
    line.trim()
        .trim_start_matches(['-', '*', '•', '>', ' '])
        .replace("**", "")
        .trim()
        .to_string()
}

/// The URL inside a value: a markdown link target, or the first bare URL.
fn url_in(value: &str) -> Option<String> {
    if let Some(caps) = MD_LINK_RE.captures(value) {
        return Some(caps[2].to_string());
    }
    BARE_URL_RE.find(value).map(|m| m.as_str().to_string())
}

fn has_document_extension(href: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    let path = url.path().to_lowercase();
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| DOCUMENT_EXTENSIONS.contains(&ext))
}

fn file_name_of(href: &str) -> String {
    Url::parse(href)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Document".to_string())
}

fn push_unique(docs: &mut Vec<DocumentLink>, name: String, url: String) {
    if docs.iter().any(|d| d.url == url) {
        return;
    }
    docs.push(DocumentLink { name, url });
}
