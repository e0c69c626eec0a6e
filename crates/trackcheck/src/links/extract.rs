use std::sync::OnceLock;

use regex::{CaptureMatches, Regex};
use serde::Serialize;

/// Target prefixes that are never treated as repository paths.
const EXCLUDED_PREFIXES: [&str; 4] = ["http://", "https://", "ftp://", "mailto:"];

/// An inline `[text](target)` link with any `#fragment` already removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LinkReference<'a> {
    pub text: &'a str,
    pub target: &'a str,
}

fn link_regex() -> &'static Regex {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    // group 1: display text, group 2: path part of the target (fragment excluded)
    LINK_REGEX.get_or_init(|| {
        Regex::new(r"\[([^\]]+)\]\(([^)#\s]+)(?:#[^)]*)?\)").expect("link regex is valid")
    })
}

/// Lazily yields the relative links of a markdown document in order of
/// appearance. Duplicates are kept.
pub fn extract_links(content: &str) -> Links<'_> {
    Links {
        captures: link_regex().captures_iter(content),
    }
}

pub struct Links<'a> {
    captures: CaptureMatches<'static, 'a>,
}

impl<'a> Iterator for Links<'a> {
    type Item = LinkReference<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for captures in self.captures.by_ref() {
            let (Some(text), Some(target)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let target = target.as_str();
            if EXCLUDED_PREFIXES
                .iter()
                .any(|prefix| target.starts_with(prefix))
            {
                continue;
            }
            return Some(LinkReference {
                text: text.as_str(),
                target,
            });
        }
        None
    }
}
