use std::fmt;

/// One segment of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Domain or operation word ("events", "analytics", ...).
    Text(&'static str),
    /// Entity identifier.
    Id(i64),
    /// Pagination parameters.
    Page { page: u32, page_size: u32 },
}

/// Ordered, structurally comparable identifier for a cached resource.
///
/// Keys form a prefix hierarchy: `["events"]` is a prefix of
/// `["events", 7, "analysis", p0x20]`, so invalidating the short key
/// covers every key extending it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryKey(Vec<Segment>);

impl QueryKey {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn text(mut self, word: &'static str) -> Self {
        self.0.push(Segment::Text(word));
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.0.push(Segment::Id(id));
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.0.push(Segment::Page { page, page_size });
        self
    }

    /// Whether this key extends (or equals) the given prefix.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match segment {
                Segment::Text(word) => write!(f, "{}", word)?,
                Segment::Id(id) => write!(f, "{}", id)?,
                Segment::Page { page, page_size } => write!(f, "p{}x{}", page, page_size)?,
            }
        }
        Ok(())
    }
}
