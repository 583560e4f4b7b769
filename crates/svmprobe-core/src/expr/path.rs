//! Debug-expression path syntax.
//!
//! A path is a dot-separated list of segments. Every segment is a name
//! followed by zero or more `[n]` index suffixes:
//!
//! ```text
//! path    := segment ('.' segment)*
//! segment := name ('[' digits ']')*
//! ```

use std::fmt;

use smallvec::SmallVec;

/// Name that refers to the most recent successful evaluation.
pub const LAST_RESULT: &str = "$last";

/// One dot-separated piece of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment
{
    /// Field, variable or symbol name (may be empty)
    pub name: String,
    /// Index suffixes in source order
    pub indices: SmallVec<[u64; 2]>,
}

impl Segment
{
    /// Parse one segment. `None` when an index suffix is malformed.
    ///
    /// ```rust
    /// use svmprobe_core::expr::Segment;
    ///
    /// let segment = Segment::parse("table[2][10]").unwrap();
    /// assert_eq!(segment.name, "table");
    /// assert_eq!(segment.indices.as_slice(), &[2, 10]);
    /// assert!(Segment::parse("table[x]").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self>
    {
        let (name, mut rest) = match text.find('[') {
            Some(open) => (&text[..open], &text[open..]),
            None => (text, ""),
        };

        let mut indices = SmallVec::new();
        while !rest.is_empty() {
            let body = rest.strip_prefix('[')?;
            let close = body.find(']')?;
            indices.push(body[..close].trim().parse::<u64>().ok()?);
            rest = &body[close + 1..];
        }
        Some(Self {
            name: name.to_string(),
            indices,
        })
    }

    /// `true` for the `$last` pseudo variable.
    pub fn is_last_result(&self) -> bool
    {
        self.name == LAST_RESULT
    }
}

impl fmt::Display for Segment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.name)?;
        for index in &self.indices {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// Split `path` on dots and parse every segment.
///
/// `None` when any segment is malformed.
pub fn parse_path(path: &str) -> Option<Vec<Segment>>
{
    path.trim().split('.').map(Segment::parse).collect()
}
