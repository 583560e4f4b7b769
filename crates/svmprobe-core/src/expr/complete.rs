//! Completion of partial debug-expression paths.
//!
//! Candidates are always relative to the last word of the input, the part
//! after the final `.` or `[`, because that is the part a line editor
//! replaces.

use tracing::debug;

use super::path::parse_path;
use super::resolver::{field_names, resolve_segments};
use crate::error::InspectResult;
use crate::types::Value;
use crate::visual::{DecodeContext, VisualNode};

// Index candidates offered before jumping to the last element.
const LEADING_INDEX_CANDIDATES: u64 = 3;

/// Candidates for `text`.
///
/// `statics` is the static-symbol tree, present only when static variable
/// completion is enabled.
///
/// ## Errors
///
/// Only `Interrupted`.
pub fn complete(
    ctx: &mut DecodeContext<'_>,
    last: Option<&Value>,
    text: &str,
    statics: Option<&SymbolTrie>,
) -> InspectResult<Vec<String>>
{
    let last_dot = text.rfind('.');
    if let Some(open) = text.rfind('[').filter(|&open| Some(open) > last_dot) {
        return complete_index(ctx, last, &text[..open], &text[open + 1..]);
    }

    let mut candidates: Vec<String> = match text.rsplit_once('.') {
        None => ctx
            .target
            .frame_variable_names()
            .into_iter()
            .filter(|name| name.starts_with(text))
            .collect(),
        Some((before, after)) => {
            let names = match resolve_text(ctx, last, before)? {
                Some(value) => field_names(ctx, &value)?,
                None => Vec::new(),
            };
            names.into_iter().filter(|name| name.starts_with(after)).collect()
        }
    };

    if let Some(statics) = statics {
        let more = statics.complete(text, !candidates.is_empty());
        candidates.extend(more);
    }
    Ok(candidates)
}

fn complete_index(
    ctx: &mut DecodeContext<'_>,
    last: Option<&Value>,
    prefix: &str,
    typed: &str,
) -> InspectResult<Vec<String>>
{
    if typed.contains(']') {
        return Ok(Vec::new());
    }
    let Some(value) = resolve_text(ctx, last, prefix)? else {
        return Ok(Vec::new());
    };
    let Some(node) = ctx.decode(&value)? else {
        return Ok(Vec::new());
    };
    let VisualNode::ArrayValue(array) = node else {
        return Ok(Vec::new());
    };

    let length = array.length();
    let mut indices: Vec<u64> = (0..length.min(LEADING_INDEX_CANDIDATES)).collect();
    if length > LEADING_INDEX_CANDIDATES {
        indices.push(length - 1);
    }
    Ok(indices
        .into_iter()
        .map(|index| format!("{index}]"))
        .filter(|candidate| candidate.starts_with(typed))
        .collect())
}

fn resolve_text(ctx: &mut DecodeContext<'_>, last: Option<&Value>, text: &str) -> InspectResult<Option<Value>>
{
    match parse_path(text) {
        Some(segments) => resolve_segments(ctx, last, &segments),
        None => Ok(None),
    }
}

/// Prefix tree of dotted static variable names.
///
/// Children keep insertion order so candidates come out in the order the
/// host listed the symbols.
#[derive(Debug, Clone)]
pub struct SymbolTrie
{
    nodes: Vec<TrieNode>,
}

#[derive(Debug, Clone)]
struct TrieNode
{
    name: String,
    children: Vec<usize>,
}

impl Default for SymbolTrie
{
    fn default() -> Self
    {
        Self {
            nodes: vec![TrieNode {
                name: String::new(),
                children: Vec::new(),
            }],
        }
    }
}

impl SymbolTrie
{
    /// Empty tree.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Tree holding every name in `names`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Self::new();
        for name in names {
            trie.insert(name.as_ref());
        }
        debug!(nodes = trie.nodes.len(), "built static symbol tree");
        trie
    }

    /// Add one dotted name.
    pub fn insert(&mut self, dotted: &str)
    {
        let mut current = 0;
        for part in dotted.split('.') {
            current = match self.child(current, part) {
                Some(existing) => existing,
                None => {
                    let index = self.nodes.len();
                    self.nodes.push(TrieNode {
                        name: part.to_string(),
                        children: Vec::new(),
                    });
                    self.nodes[current].children.push(index);
                    index
                }
            };
        }
    }

    /// `true` when no names were inserted.
    pub fn is_empty(&self) -> bool
    {
        self.nodes[0].children.is_empty()
    }

    /// Completions of `text` relative to its last dotted word.
    ///
    /// Complete words must match a node exactly; the last word matches by
    /// prefix. A unique match is taken and the walk continues into its
    /// subtree for as long as the match stays unique. With
    /// `has_other_candidates` set the last word is only prefix-matched, so
    /// the result lines up with the other candidates.
    pub fn complete(&self, text: &str, has_other_candidates: bool) -> Vec<String>
    {
        let mut parts: Vec<String> = text.split('.').map(str::to_string).collect();
        let mut current = 0;
        let mut index = 0;
        let mut used = 0;
        let mut appending = false;
        let mut findings = Vec::new();

        while index < parts.len() {
            let part = parts[index].as_str();
            let by_prefix = appending || index + 1 == parts.len();
            let matches: Vec<usize> = self.nodes[current]
                .children
                .iter()
                .copied()
                .filter(|&child| {
                    let name = &self.nodes[child].name;
                    if by_prefix { name.starts_with(part) } else { name == part }
                })
                .collect();

            if matches.len() == 1 && !(by_prefix && has_other_candidates) {
                current = matches[0];
                parts[index].clone_from(&self.nodes[current].name);
                index += 1;
                if index >= parts.len() {
                    parts.push(String::new());
                    appending = true;
                } else {
                    used += 1;
                }
            } else {
                findings = matches;
                break;
            }
        }

        let resolved = &parts[used..index.min(parts.len())];
        if findings.is_empty() {
            if resolved.is_empty() {
                Vec::new()
            } else {
                vec![resolved.join(".")]
            }
        } else {
            findings
                .into_iter()
                .map(|node| {
                    let mut words = resolved.to_vec();
                    words.push(self.nodes[node].name.clone());
                    words.join(".")
                })
                .collect()
        }
    }

    fn child(&self, parent: usize, name: &str) -> Option<usize>
    {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == name)
    }
}
