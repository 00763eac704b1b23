use std::collections::BTreeMap;

/// `key: value` pairs from a leading `---` block. Values lose surrounding
/// quotes; anything that is not a `key: value` line is ignored.
#[must_use]
pub fn parse_front_matter(content: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let Some(rest) = content.strip_prefix("---") else {
        return out;
    };
    let Some(end) = rest.find("---") else {
        return out;
    };

    for line in rest[..end].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        out.insert(key.to_string(), value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_simple_pairs() {
        let meta = parse_front_matter(
            "---\nproject: \"Widget\"\nphase: 'Phase 2: Build'\nnot a pair\n---\n# Body\n",
        );
        assert_eq!(meta.get("project").map(String::as_str), Some("Widget"));
        assert_eq!(meta.get("phase").map(String::as_str), Some("Phase 2: Build"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn requires_leading_and_closing_fence() {
        assert!(parse_front_matter("# Title\n---\nproject: x\n---\n").is_empty());
        assert!(parse_front_matter("---\nproject: x\n").is_empty());
    }
}
