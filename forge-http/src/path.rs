use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// RFC 3986 unreserved characters plus `/`, used when rendering a greedy
/// label (which must preserve path separators) and when re-encoding query
/// values (§4.2 "Query").
const UNRESERVED_PLUS_SLASH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// RFC 3986 unreserved characters only — used for a non-greedy label, which
/// must percent-encode `/` like any other reserved character.
const UNRESERVED: &AsciiSet = &UNRESERVED_PLUS_SLASH.add(b'/');

/// One segment of a parsed [`PathPattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Label(String),
    GreedyLabel(String),
}

/// A validated `http` trait path pattern, e.g. `/widgets/{id}/items/{tail+}`.
///
/// Validation happens once, at load time (construction), per the testable
/// property in §8.10: a pattern with two greedy labels, or a non-greedy
/// label that follows a greedy one, is rejected before any request is ever
/// built from it.
#[derive(Clone, Debug)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPattern(pub String);

impl std::fmt::Display for InvalidPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid path pattern: {}", self.0)
    }
}

impl std::error::Error for InvalidPattern {}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, InvalidPattern> {
        let mut segments = Vec::new();
        let mut seen_labels = std::collections::HashSet::new();
        let mut greedy_index: Option<usize> = None;
        let mut last_non_greedy_index: Option<usize> = None;

        for (i, raw) in pattern.split('/').filter(|s| !s.is_empty()).enumerate() {
            let segment = if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if let Some(name) = inner.strip_suffix('+') {
                    if greedy_index.is_some() {
                        return Err(InvalidPattern(format!(
                            "pattern `{pattern}` has more than one greedy label"
                        )));
                    }
                    greedy_index = Some(i);
                    Segment::GreedyLabel(name.to_string())
                } else {
                    last_non_greedy_index = Some(i);
                    Segment::Label(inner.to_string())
                }
            } else {
                Segment::Literal(raw.to_string())
            };

            if let Segment::Label(name) | Segment::GreedyLabel(name) = &segment {
                if !seen_labels.insert(name.clone()) {
                    return Err(InvalidPattern(format!(
                        "pattern `{pattern}` reuses label `{{{name}}}`"
                    )));
                }
            }

            segments.push(segment);
        }

        if let (Some(greedy), Some(last_non_greedy)) = (greedy_index, last_non_greedy_index) {
            if greedy < last_non_greedy {
                return Err(InvalidPattern(format!(
                    "pattern `{pattern}` has a non-greedy label after its greedy label"
                )));
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Label(name) | Segment::GreedyLabel(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the pattern given a lookup from label name to raw (unencoded)
    /// value. Returns a serialization error if a label's value is missing.
    pub fn render(&self, value_of: impl Fn(&str) -> Option<String>) -> Result<String, InvalidPattern> {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Label(name) => {
                    let value = value_of(name)
                        .ok_or_else(|| InvalidPattern(format!("missing required label `{{{name}}}`")))?;
                    out.push_str(&utf8_percent_encode(&value, UNRESERVED).to_string());
                }
                Segment::GreedyLabel(name) => {
                    let value = value_of(name)
                        .ok_or_else(|| InvalidPattern(format!("missing required label `{{{name}+}}`")))?;
                    out.push_str(&utf8_percent_encode(&value, UNRESERVED_PLUS_SLASH).to_string());
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    /// Literal-only patterns of equal length with identical (case-insensitive)
    /// literals are considered equivalent (§4.2 "Path templating").
    pub fn is_equivalent_to(&self, other: &PathPattern) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        self.segments.iter().zip(&other.segments).all(|(a, b)| match (a, b) {
            (Segment::Literal(x), Segment::Literal(y)) => x.eq_ignore_ascii_case(y),
            (Segment::Label(_), Segment::Label(_)) => true,
            (Segment::GreedyLabel(_), Segment::GreedyLabel(_)) => true,
            _ => false,
        })
    }
}
