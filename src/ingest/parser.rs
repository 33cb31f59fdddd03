// src/ingest/parser.rs
use quick_xml::de::from_reader;
use serde::Deserialize;

use crate::error::ParseError;
use crate::ingest::types::FeedEntry;

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    // quick-xml keys keep the namespace prefix; accept both spellings
    #[serde(rename = "media:thumbnail", alias = "thumbnail", default)]
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: String,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(rename = "@url", default)]
    url: String,
}

/// Decode an Atom document into entries, in document order.
///
/// Missing `title`, `link` or `media:thumbnail` decode to empty strings.
/// Any markup error fails the whole document; there are no partial results.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, ParseError> {
    let feed: AtomFeed = from_reader(bytes)?;
    Ok(feed
        .entries
        .into_iter()
        .map(|e| FeedEntry {
            title: e.title.map(|t| t.value).unwrap_or_default(),
            link: e.links.into_iter().next().map(|l| l.href).unwrap_or_default(),
            thumbnail: e.thumbnail.map(|t| t.url).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <title>recipes</title>
  <link rel="alternate" href="https://example.test/r/recipes/"/>
  <entry>
    <title>Lemon &amp; Garlic Chicken</title>
    <link href="https://example.test/r/recipes/1"/>
    <media:thumbnail url="https://img.example.test/1.jpg"/>
  </entry>
  <entry>
    <title>Plain Rice</title>
    <link href="https://example.test/r/recipes/2"/>
  </entry>
</feed>"#;

    #[test]
    fn entries_keep_document_order_and_fields() {
        let out = parse_feed(TWO_ENTRIES.as_bytes()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Lemon & Garlic Chicken");
        assert_eq!(out[0].link, "https://example.test/r/recipes/1");
        assert_eq!(out[0].thumbnail, "https://img.example.test/1.jpg");
        assert_eq!(out[1].title, "Plain Rice");
    }

    #[test]
    fn missing_thumbnail_is_empty_string() {
        let out = parse_feed(TWO_ENTRIES.as_bytes()).unwrap();
        assert_eq!(out[1].thumbnail, "");
    }

    #[test]
    fn feed_without_entries_is_empty() {
        let out = parse_feed(br#"<feed><title>nothing here</title></feed>"#).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn titles_are_kept_as_written() {
        let xml = r#"<feed><entry><title>Slow  Cooker   Chili (v2)</title></entry></feed>"#;
        let out = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(out[0].title, "Slow  Cooker   Chili (v2)");
    }

    #[test]
    fn feed_metadata_between_entries_is_skipped() {
        let xml = r#"<feed>
  <entry><title>a</title><link href="https://example.test/a"/></entry>
  <updated>2024-05-01T00:00:00Z</updated>
  <entry><title>b</title><link href="https://example.test/b"/></entry>
</feed>"#;
        let out = parse_feed(xml.as_bytes()).unwrap();
        let titles: Vec<_> = out.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
        assert_eq!(out[1].link, "https://example.test/b");
    }

    #[test]
    fn first_link_wins_when_links_are_split_by_other_elements() {
        let xml = r#"<feed><entry>
  <link rel="alternate" href="https://example.test/first"/>
  <title>split</title>
  <link rel="enclosure" href="https://example.test/second"/>
</entry></feed>"#;
        let out = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "split");
        assert_eq!(out[0].link, "https://example.test/first");
    }

    #[test]
    fn mismatched_tags_fail() {
        let xml = r#"<feed><entry><title>ok</title></entry><entry><title>broken</entry></feed>"#;
        assert!(parse_feed(xml.as_bytes()).is_err());
    }

    #[test]
    fn truncated_document_fails() {
        let xml = r#"<feed><entry><title>ok</title></entry><entry><title>cut"#;
        assert!(parse_feed(xml.as_bytes()).is_err());
    }
}
