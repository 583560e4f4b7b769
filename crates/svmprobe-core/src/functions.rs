//! # Function Index
//!
//! Searchable list of compiled methods, built from the host's function
//! listing (the `info functions` output of GDB).
//!
//! Only `static` entries describe compiled code. Each entry is reduced to
//! the method's qualified name plus parameter list:
//!
//! ```text
//! static void java.util.ArrayList.add(java.lang.Object);
//!     -> java.util.ArrayList.add(java.lang.Object)
//! static CPointer(char) *com.oracle.svm.core.c.CGlobalData.get();
//!     -> com.oracle.svm.core.c.CGlobalData.get()
//! ```
//!
//! Searches ignore case and treat `$` like `.`, so `arraylist.<init>` and
//! `Outer.Inner` both find what a user means.

use tracing::debug;

/// Leading marker of entries describing compiled code.
const STATIC_PREFIX: &str = "static ";
/// Return types spelled with a space inside (`CPointer(char) *`).
const COMPOUND_RETURN_TYPES: [&str; 2] = ["static CPointer", "static CStruct"];
/// Marker of installed-code lines in the listing.
const INSTALLED_CODE_PREFIX: &str = "File ";

/// Compiled methods of the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionIndex
{
    entries: Vec<String>,
    installed_code: Vec<String>,
}

impl FunctionIndex
{
    /// Parse a function listing, one line per entry.
    pub fn from_listing<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for line in lines {
            let line = line.as_ref();
            if let Some(entry) = parse_entry(line) {
                index.entries.push(entry);
            } else if let Some(code) = parse_installed_code(line) {
                index.installed_code.push(code);
            }
        }
        debug!(
            functions = index.entries.len(),
            installed = index.installed_code.len(),
            "built function index"
        );
        index
    }

    /// Every indexed entry, in listing order.
    pub fn entries(&self) -> &[String]
    {
        &self.entries
    }

    /// Runtime-installed code units (`File <name>` lines carrying an
    /// address), in listing order.
    pub fn installed_code(&self) -> &[String]
    {
        &self.installed_code
    }

    /// Entries whose name contains `text`, in listing order.
    ///
    /// Only the part before the parameter list is searched.
    pub fn search(&self, text: &str) -> Vec<&str>
    {
        let needle = normalize(text);
        self.entries
            .iter()
            .filter(|entry| {
                let name = entry.split('(').next().unwrap_or(entry);
                normalize(name).contains(&needle)
            })
            .map(String::as_str)
            .collect()
    }
}

/// Choose entries from a search result.
///
/// Accepts a single index (`0`, or `-1` counting from the end), a range
/// `a:b` with either bound optional and negative bounds counting from the
/// end, or `:` for all of them. `None` when the text is not a selection or
/// a single index is out of range.
///
/// ```rust
/// use svmprobe_core::functions::select;
///
/// let results = ["a()", "b()", "c()", "d()"];
/// assert_eq!(select(&results, "-1"), Some(vec!["d()"]));
/// assert_eq!(select(&results, "1:3"), Some(vec!["b()", "c()"]));
/// assert_eq!(select(&results, ":"), Some(results.to_vec()));
/// assert_eq!(select(&results, "7"), None);
/// ```
pub fn select<'a>(results: &[&'a str], selection: &str) -> Option<Vec<&'a str>>
{
    let len = i64::try_from(results.len()).ok()?;
    let resolve = |index: i64| if index < 0 { len + index } else { index };
    let selection = selection.trim();

    match selection.split_once(':') {
        None => {
            let index = resolve(selection.parse().ok()?);
            let index = usize::try_from(index).ok()?;
            results.get(index).map(|entry| vec![*entry])
        }
        Some((start, end)) => {
            let bound = |text: &str, default: i64| -> Option<i64> {
                let text = text.trim();
                if text.is_empty() {
                    Some(default)
                } else {
                    text.parse().ok().map(|value| resolve(value).clamp(0, len))
                }
            };
            let start = usize::try_from(bound(start, 0)?).ok()?;
            let end = usize::try_from(bound(end, len)?).ok()?;
            Some(results.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
    }
}

fn parse_entry(line: &str) -> Option<String>
{
    if !line.starts_with(STATIC_PREFIX) {
        return None;
    }
    // Skip the return type. Compound return types may span a second token,
    // which always ends before the parameter list starts.
    let mut rest = &line[STATIC_PREFIX.len()..];
    rest = &rest[rest.find(' ')? + 1..];
    if COMPOUND_RETURN_TYPES.iter().any(|prefix| line.starts_with(prefix)) {
        let params = rest.find('(').unwrap_or(rest.len());
        if let Some(space) = rest.find(' ').filter(|&space| space < params) {
            rest = &rest[space + 1..];
        }
    }
    let entry = rest
        .trim_start_matches([' ', '[', ']', '*'])
        .trim_end_matches([' ', ';']);
    (!entry.is_empty()).then(|| entry.to_string())
}

fn parse_installed_code(line: &str) -> Option<String>
{
    let rest = line.strip_prefix(INSTALLED_CODE_PREFIX)?;
    if !rest.contains("at 0x") {
        return None;
    }
    Some(rest.strip_suffix(':').unwrap_or(rest).to_string())
}

fn normalize(text: &str) -> String
{
    text.to_lowercase().replace('$', ".")
}

#[cfg(test)]
mod tests
{
    use super::*;

    const LISTING: &str = "\
All defined functions:

File java/util/ArrayList.java:
static void java.util.ArrayList.add(java.lang.Object);
static boolean java.util.ArrayList.isEmpty();
static java.lang.Object[] java.util.ArrayList.toArray();
static CPointer(char) *com.oracle.svm.core.c.CGlobalData.get();
static CStruct pthread_attr_t *com.oracle.svm.core.posix.Threads.attr(int);
static void com.example.Outer$Inner.<init>(com.example.Outer);
int main(int, char **);
File InstalledCodeObserver at 0x7f001000:
";

    #[test]
    fn test_parses_static_entries()
    {
        let index = FunctionIndex::from_listing(LISTING.lines());
        assert_eq!(index.entries(), &[
            "java.util.ArrayList.add(java.lang.Object)",
            "java.util.ArrayList.isEmpty()",
            "java.util.ArrayList.toArray()",
            "com.oracle.svm.core.c.CGlobalData.get()",
            "com.oracle.svm.core.posix.Threads.attr(int)",
            "com.example.Outer$Inner.<init>(com.example.Outer)",
        ]);
        assert_eq!(index.installed_code(), &["InstalledCodeObserver at 0x7f001000"]);
    }

    #[test]
    fn test_search_normalizes()
    {
        let index = FunctionIndex::from_listing(LISTING.lines());
        assert_eq!(index.search("ARRAYLIST.is"), vec!["java.util.ArrayList.isEmpty()"]);
        assert_eq!(index.search("outer.inner"), vec!["com.example.Outer$Inner.<init>(com.example.Outer)"]);
        // Parameter lists are not searched.
        assert!(index.search("java.lang.Object").is_empty());
    }

    #[test]
    fn test_select_ranges()
    {
        let results = ["a()", "b()", "c()"];
        assert_eq!(select(&results, "0"), Some(vec!["a()"]));
        assert_eq!(select(&results, "-2:"), Some(vec!["b()", "c()"]));
        assert_eq!(select(&results, "2:1"), Some(vec![]));
        assert_eq!(select(&results, "x"), None);
        assert_eq!(select(&results, "-4"), None);
    }
}
