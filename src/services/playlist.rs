use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::models::{Channel, DEFAULT_GROUP};

lazy_static! {
    /// Regex to parse EXTINF attributes (tvg-id="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"(\w+(?:-\w+)*)="([^"]*)""#).unwrap();
}

/// Parsed EXTINF line data
#[derive(Debug, Default)]
struct ExtinfData {
    attributes: HashMap<String, String>,
    title: String,
}

/// Generate a deterministic channel ID from URL and source index.
/// Re-parsing the same document always yields the same ids.
fn generate_channel_id(url: &str, index: usize) -> String {
    let hash: i32 = url.chars().fold(0, |acc, c| {
        ((acc << 5).wrapping_sub(acc)).wrapping_add(c as i32)
    });
    format!("ch_{}_{}", hash.unsigned_abs(), index)
}

/// Parse an EXTINF line
/// Format: #EXTINF:duration tvg-id="..." tvg-name="..." tvg-logo="..." group-title="...",Title
///
/// The title is everything after the last comma; attributes are matched
/// independently over the segment before it, so a missing or malformed
/// attribute never affects the others.
fn parse_extinf(line: &str) -> Option<ExtinfData> {
    let content = line.strip_prefix("#EXTINF:")?;

    let (header, title) = match content.rfind(',') {
        Some(pos) => (&content[..pos], content[pos + 1..].trim().to_string()),
        None => (content, String::new()),
    };

    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(header) {
        let key = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        attributes.insert(key, value);
    }

    Some(ExtinfData { attributes, title })
}

/// Parse an M3U playlist document into channel records.
///
/// Pure and best-effort: no I/O, no state, and malformed lines are skipped
/// or defaulted rather than failing the whole document. Records are emitted
/// in source order and every record has a non-empty url - EXTINF lines with
/// no following URI line are dropped.
pub fn parse_playlist(document: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut current_extinf: Option<ExtinfData> = None;

    for raw_line in document.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        }

        // EXTINF opens a record; a second EXTINF before a URI line replaces
        // the dangling one
        if line.starts_with("#EXTINF:") {
            current_extinf = parse_extinf(line);
            continue;
        }

        // Other comments (#EXTM3U included) neither open nor close a record
        if line.starts_with('#') {
            continue;
        }

        // URI line: closes the open record, ignored when none is open
        if let Some(extinf) = current_extinf.take() {
            let url = line.to_string();
            let group = extinf
                .attributes
                .get("group-title")
                .filter(|g| !g.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_GROUP.to_string());

            channels.push(Channel {
                id: generate_channel_id(&url, channels.len()),
                title: extinf.title,
                group,
                logo: extinf.attributes.get("tvg-logo").cloned().unwrap_or_default(),
                url,
                tvg_id: extinf.attributes.get("tvg-id").cloned().unwrap_or_default(),
                tvg_name: extinf.attributes.get("tvg-name").cloned().unwrap_or_default(),
            });
        }
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = parse_extinf(line).unwrap();

        assert_eq!(extinf.title, "Globo HD");
        assert_eq!(extinf.attributes.get("tvg-id"), Some(&"globo".to_string()));
        assert_eq!(extinf.attributes.get("group-title"), Some(&"TV".to_string()));
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let extinf = parse_extinf("#EXTINF:-1,Canal Teste").unwrap();

        assert_eq!(extinf.title, "Canal Teste");
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_parse_extinf_no_comma_has_empty_title() {
        let extinf = parse_extinf("#EXTINF:-1").unwrap();
        assert_eq!(extinf.title, "");
    }

    #[test]
    fn test_parse_well_formed_entries_in_order() {
        let doc = "#EXTM3U\n\
                   #EXTINF:-1 tvg-id=\"one\" group-title=\"News\",Channel One\n\
                   http://host/one.ts\n\
                   #EXTINF:-1,Channel Two\n\
                   http://host/two.ts\n";
        let channels = parse_playlist(doc);

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].title, "Channel One");
        assert_eq!(channels[0].group, "News");
        assert_eq!(channels[0].url, "http://host/one.ts");
        assert_eq!(channels[0].tvg_id, "one");
        assert_eq!(channels[1].title, "Channel Two");
        assert_eq!(channels[1].group, DEFAULT_GROUP);
        assert_eq!(channels[1].url, "http://host/two.ts");
    }

    #[test]
    fn test_dangling_extinf_is_dropped() {
        let doc = "#EXTINF:-1,Dropped\n\
                   #EXTINF:-1,Kept\n\
                   http://host/kept.ts\n";
        let channels = parse_playlist(doc);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Kept");
    }

    #[test]
    fn test_dangling_extinf_at_eof_is_dropped() {
        let channels = parse_playlist("#EXTINF:-1,No Url");
        assert!(channels.is_empty());
    }

    #[test]
    fn test_attributes_are_independent() {
        let channels = parse_playlist("#EXTINF:-1 tvg-id=\"5\",Title\nhttp://host/a.ts\n");

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].tvg_id, "5");
        assert_eq!(channels[0].title, "Title");
        assert_eq!(channels[0].group, DEFAULT_GROUP);
        assert_eq!(channels[0].logo, "");
        assert_eq!(channels[0].tvg_name, "");
    }

    #[test]
    fn test_attribute_values_with_embedded_comma() {
        let doc = "#EXTINF:-1 group-title=\"News, World\",CNN\nhttp://host/cnn.ts\n";
        let channels = parse_playlist(doc);

        assert_eq!(channels[0].group, "News, World");
        assert_eq!(channels[0].title, "CNN");
    }

    #[test]
    fn test_bare_uri_and_preamble_lines_ignored() {
        let doc = "some preamble\n\
                   http://host/orphan.ts\n\
                   #EXTINF:-1,Real\n\
                   http://host/real.ts\n";
        let channels = parse_playlist(doc);

        // lines before the first EXTINF are URI lines with no open record
        // and produce nothing
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "http://host/real.ts");
    }

    #[test]
    fn test_empty_and_comment_only_documents() {
        assert!(parse_playlist("").is_empty());
        assert!(parse_playlist("#EXTM3U\n# a comment\n#EXTVLCOPT:x=1\n").is_empty());
    }

    #[test]
    fn test_malformed_attribute_keeps_default() {
        let doc = "#EXTINF:-1 group-title=News tvg-id=\"ok\",Title\nhttp://host/a.ts\n";
        let channels = parse_playlist(doc);

        // unquoted value fails to match, field stays at its default
        assert_eq!(channels[0].group, DEFAULT_GROUP);
        assert_eq!(channels[0].tvg_id, "ok");
    }

    #[test]
    fn test_ids_deterministic_across_parses() {
        let doc = "#EXTINF:-1,A\nhttp://host/a.ts\n#EXTINF:-1,B\nhttp://host/b.ts\n";
        let first = parse_playlist(doc);
        let second = parse_playlist(doc);

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[1].id, second[1].id);
        assert_ne!(first[0].id, first[1].id);
    }

    #[test]
    fn test_url_and_title_verbatim() {
        let url = "http://host:8080/live/abc/123.m3u8?token=x%20y";
        let title = "Ch&nnel  [HD]";
        let doc = format!("#EXTINF:-1,{title}\n{url}\n");
        let channels = parse_playlist(&doc);

        assert_eq!(channels[0].url, url);
        assert_eq!(channels[0].title, title);
    }
}
