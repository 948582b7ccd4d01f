use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub matched: bool,
}

impl Run {
    fn plain(text: &str) -> Self {
        Run {
            text: text.to_string(),
            matched: false,
        }
    }

    fn matched(text: &str) -> Self {
        Run {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Case-insensitive literal matcher over an ordered keyword list.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Highlighter { pattern: None };
        }

        // An alternation of escaped literals always compiles, barring size limits.
        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| log::warn!("keyword pattern rejected, highlighting disabled: {e}"))
            .ok();
        Highlighter { pattern }
    }

    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// Splits `text` into alternating plain and matched runs. Neighbouring runs
    /// never have the same kind.
    pub fn runs(&self, text: &str) -> Vec<Run> {
        let Some(pattern) = &self.pattern else {
            return vec![Run::plain(text)];
        };

        let mut runs = Vec::new();
        let mut prev_end = 0;
        for m in pattern.find_iter(text) {
            if m.start() > prev_end {
                runs.push(Run::plain(&text[prev_end..m.start()]));
            }
            match runs.last_mut() {
                // Back-to-back hits become one run.
                Some(last) if last.matched && m.start() == prev_end => {
                    last.text.push_str(m.as_str());
                }
                _ => runs.push(Run::matched(m.as_str())),
            }
            prev_end = m.end();
        }
        if prev_end < text.len() || runs.is_empty() {
            runs.push(Run::plain(&text[prev_end..]));
        }
        runs
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn runs_to_html(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        if run.matched {
            out.push_str("<span class='search-match'>");
            out.push_str(&escape_html(&run.text));
            out.push_str("</span>");
        } else {
            out.push_str(&escape_html(&run.text));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(runs: &[Run]) -> Vec<(&str, bool)> {
        runs.iter().map(|r| (r.text.as_str(), r.matched)).collect()
    }

    #[test]
    fn no_keywords_yields_single_plain_run() {
        let h = Highlighter::new::<&str>(&[]);
        assert!(!h.is_active());
        assert_eq!(texts(&h.runs("lounge")), vec![("lounge", false)]);
        assert_eq!(texts(&h.runs("")), vec![("", false)]);
    }

    #[test]
    fn matches_case_insensitively() {
        let h = Highlighter::new(&["RUST"]);
        assert_eq!(
            texts(&h.runs("rust-lang and Rust")),
            vec![("rust", true), ("-lang and ", false), ("Rust", true)]
        );
    }

    #[test]
    fn keywords_are_literal() {
        let h = Highlighter::new(&["c++"]);
        assert_eq!(
            texts(&h.runs("about c++ here")),
            vec![("about ", false), ("c++", true), (" here", false)]
        );
    }

    #[test]
    fn earlier_keyword_wins_at_same_position() {
        let h = Highlighter::new(&["lounge", "lou"]);
        assert_eq!(texts(&h.runs("lounge")), vec![("lounge", true)]);
        let h = Highlighter::new(&["lou", "lounge"]);
        assert_eq!(texts(&h.runs("lounge")), vec![("lou", true), ("nge", false)]);
    }

    #[test]
    fn touching_matches_merge() {
        let h = Highlighter::new(&["ab"]);
        assert_eq!(texts(&h.runs("abAB")), vec![("abAB", true)]);
        let h = Highlighter::new(&["chat", "room"]);
        assert_eq!(
            texts(&h.runs("chatroom chat")),
            vec![("chatroom", true), (" ", false), ("chat", true)]
        );
        assert_eq!(
            runs_to_html(&h.runs("chatroom")),
            "<span class='search-match'>chatroom</span>"
        );
    }

    #[test]
    fn html_rendering_escapes_every_run() {
        let h = Highlighter::new(&["<b>"]);
        assert_eq!(
            runs_to_html(&h.runs("a<b>&'")),
            "a<span class='search-match'>&lt;b&gt;</span>&amp;&#x27;"
        );
    }
}
