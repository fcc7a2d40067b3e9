//! Tree search and replace
//!
//! Both passes walk the tree in pre-order through [`ChildCursor`]s, start
//! node included. Matches are recorded in a [`SearchResult`] that mirrors
//! how matches nest inside each other.
//!
//! A replace pass processes the descendants of a match before replacing the
//! match itself, so the replacer always sees up-to-date children. The node a
//! replacer returns is never searched again.

use crate::{Ast, ChildCursor, LanguageFeature, NodeId, NodeKind, TreeError};

/// Node predicate
pub trait Matcher {
    fn matches(&self, ast: &Ast, node: NodeId) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Ast, NodeId) -> bool,
{
    fn matches(&self, ast: &Ast, node: NodeId) -> bool {
        self(ast, node)
    }
}

/// Produces the node a match is replaced with; `None` removes the match.
///
/// An `Err` is recorded against the match and the pass goes on.
pub trait Replacer {
    fn replace(&mut self, ast: &mut Ast, node: NodeId) -> Result<Option<NodeId>, String>;
}

impl<F> Replacer for F
where
    F: FnMut(&mut Ast, NodeId) -> Result<Option<NodeId>, String>,
{
    fn replace(&mut self, ast: &mut Ast, node: NodeId) -> Result<Option<NodeId>, String> {
        self(ast, node)
    }
}

type Prune = Box<dyn Fn(&Ast, NodeId) -> bool>;

/// One matched node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub node: NodeId,
    /// Parent of the node when it matched; `None` for a matched root
    pub parent: Option<NodeId>,
    /// Index of the closest enclosing match in the result
    pub enclosing: Option<usize>,
    /// Why the node could not be replaced
    pub error: Option<String>,
    /// Node that took its place; `None` if not replaced or removed
    pub replaced_by: Option<NodeId>,
}

/// Matches of a search, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    entries: Vec<SearchEntry>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SearchEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchEntry> {
        self.entries.iter()
    }

    /// Matched node ids, in traversal order
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| e.node).collect()
    }

    /// Indexes of the matches not nested in another match
    pub fn roots(&self) -> Vec<usize> {
        (0..self.entries.len())
            .filter(|&i| self.entries[i].enclosing.is_none())
            .collect()
    }

    /// Indexes of the matches directly nested in match `index`
    pub fn children(&self, index: usize) -> Vec<usize> {
        (0..self.entries.len())
            .filter(|&i| self.entries[i].enclosing == Some(index))
            .collect()
    }

    fn push(&mut self, node: NodeId, parent: Option<NodeId>, enclosing: Option<usize>) -> usize {
        self.entries.push(SearchEntry {
            node,
            parent,
            enclosing,
            error: None,
            replaced_by: None,
        });
        self.entries.len() - 1
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a SearchEntry;
    type IntoIter = std::slice::Iter<'a, SearchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Read-only search
pub struct Search<M> {
    matcher: M,
    recursive: bool,
    only_first: bool,
    prune: Option<Prune>,
}

impl<M: Matcher> Search<M> {
    pub fn new(matcher: M) -> Self {
        Self {
            matcher,
            recursive: true,
            only_first: false,
            prune: None,
        }
    }

    /// Keep searching inside matched nodes (default `true`)
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Stop at the first match (default `false`)
    pub fn only_first(mut self, only_first: bool) -> Self {
        self.only_first = only_first;
        self
    }

    /// Never look inside nodes accepted by `prune`, the start node excepted
    pub fn prune(mut self, prune: impl Fn(&Ast, NodeId) -> bool + 'static) -> Self {
        self.prune = Some(Box::new(prune));
        self
    }

    pub fn run(&self, ast: &Ast, start: NodeId) -> SearchResult {
        let mut result = SearchResult::default();
        self.visit(ast, start, None, None, true, &mut result);
        log::trace!("search from {start}: {} match(es)", result.len());
        result
    }

    /// Returns `true` once the search must stop
    fn visit(
        &self,
        ast: &Ast,
        node: NodeId,
        parent: Option<NodeId>,
        enclosing: Option<usize>,
        is_start: bool,
        result: &mut SearchResult,
    ) -> bool {
        let mut enclosing = enclosing;
        let matched = self.matcher.matches(ast, node);
        if matched {
            enclosing = Some(result.push(node, parent, enclosing));
            if self.only_first {
                return true;
            }
            if !self.recursive {
                return false;
            }
        }
        if !is_start && self.prune.as_ref().is_some_and(|prune| prune(ast, node)) {
            return false;
        }
        let mut cursor = ast.cursor(node);
        while let Some(child) = cursor.next(ast) {
            if self.visit(ast, child, Some(node), enclosing, false, result) {
                return true;
            }
        }
        false
    }
}

/// Outcome of a replace pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    pub result: SearchResult,
    pub matched: usize,
    pub replaced: usize,
}

impl ReplaceReport {
    /// Matches that could not be replaced, with the reason
    pub fn errors(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.result
            .iter()
            .filter_map(|e| e.error.as_deref().map(|error| (e.node, error)))
    }

    /// Whether every match was replaced
    pub fn is_complete(&self) -> bool {
        self.matched == self.replaced
    }
}

/// Search and replace
pub struct Replace<M, R> {
    matcher: M,
    replacer: R,
    recursive: bool,
    only_first: bool,
}

impl<M: Matcher, R: Replacer> Replace<M, R> {
    pub fn new(matcher: M, replacer: R) -> Self {
        Self {
            matcher,
            replacer,
            recursive: true,
            only_first: false,
        }
    }

    /// Also replace matches nested in other matches (default `true`)
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replace only the first match (default `false`)
    pub fn only_first(mut self, only_first: bool) -> Self {
        self.only_first = only_first;
        self
    }

    pub fn run(&mut self, ast: &mut Ast, start: NodeId) -> ReplaceReport {
        let mut report = ReplaceReport::default();
        if self.matcher.matches(ast, start) {
            let parent = ast.parent_of(start);
            let index = report.result.push(start, parent, None);
            report.matched += 1;
            if self.recursive && !self.only_first {
                self.visit_children(ast, start, Some(index), &mut report);
            }
            self.replace_start(ast, start, parent, index, &mut report);
        } else {
            self.visit_children(ast, start, None, &mut report);
        }
        log::debug!(
            "replace from {start}: {} matched, {} replaced",
            report.matched,
            report.replaced
        );
        report
    }

    /// Returns `true` once the pass must stop
    fn visit_children(
        &mut self,
        ast: &mut Ast,
        parent: NodeId,
        enclosing: Option<usize>,
        report: &mut ReplaceReport,
    ) -> bool {
        let mut cursor = ast.cursor(parent);
        while let Some(child) = cursor.next(ast) {
            if !self.matcher.matches(ast, child) {
                if self.visit_children(ast, child, enclosing, report) {
                    return true;
                }
                continue;
            }

            let index = report.result.push(child, Some(parent), enclosing);
            report.matched += 1;
            if self.recursive
                && !self.only_first
                && self.visit_children(ast, child, Some(index), report)
            {
                return true;
            }
            self.apply(ast, &mut cursor, child, index, report);
            if self.only_first {
                return true;
            }
        }
        false
    }

    fn apply(
        &mut self,
        ast: &mut Ast,
        cursor: &mut ChildCursor,
        node: NodeId,
        index: usize,
        report: &mut ReplaceReport,
    ) {
        let outcome = self
            .replacer
            .replace(ast, node)
            .and_then(|replacement| {
                cursor
                    .set(ast, replacement)
                    .map(|()| replacement)
                    .map_err(|e: TreeError| e.to_string())
            });
        self.record(outcome, index, report);
    }

    fn replace_start(
        &mut self,
        ast: &mut Ast,
        start: NodeId,
        parent: Option<NodeId>,
        index: usize,
        report: &mut ReplaceReport,
    ) {
        let outcome = self.replacer.replace(ast, start).and_then(|replacement| {
            match parent {
                Some(parent) => {
                    let mut cursor = ast.cursor(parent);
                    while let Some(child) = cursor.next(ast) {
                        if child == start {
                            return cursor
                                .set(ast, replacement)
                                .map(|()| replacement)
                                .map_err(|e| e.to_string());
                        }
                    }
                    Err(format!("{start} is no longer a child of {parent}"))
                }
                None if ast.root() == Some(start) => match replacement {
                    Some(new_root) if ast.kind(new_root).is_query() => {
                        ast.set_root(new_root);
                        Ok(Some(new_root))
                    }
                    Some(_) => Err("the root can only be replaced by a query".to_string()),
                    None => Err("the root cannot be removed".to_string()),
                },
                None => Err(format!("{start} has no parent to replace it in")),
            }
        });
        self.record(outcome, index, report);
    }

    fn record(
        &self,
        outcome: Result<Option<NodeId>, String>,
        index: usize,
        report: &mut ReplaceReport,
    ) {
        let entry = &mut report.result.entries[index];
        match outcome {
            Ok(replacement) => {
                entry.replaced_by = replacement;
                report.replaced += 1;
            }
            Err(error) => {
                log::debug!("replacement of {} failed: {error}", entry.node);
                entry.error = Some(error);
            }
        }
    }
}

/// Search for column references of one query, not descending into nested
/// queries
pub fn columns_of_query(ast: &Ast, query: NodeId) -> SearchResult {
    Search::new(|ast: &Ast, id: NodeId| matches!(ast.kind(id), NodeKind::Column(_)))
        .prune(|ast, id| ast.kind(id).is_query())
        .run(ast, query)
}

/// Queries nested anywhere below `query`, outermost first, `query` excluded
pub fn nested_queries(ast: &Ast, query: NodeId) -> Vec<NodeId> {
    Search::new(move |ast: &Ast, id: NodeId| id != query && ast.kind(id).is_query())
        .recursive(false)
        .run(ast, query)
        .nodes()
}

/// Optional features used anywhere in the subtree, without duplicates
pub fn used_features(ast: &Ast, start: NodeId) -> Vec<LanguageFeature> {
    let mut features: Vec<LanguageFeature> = Vec::new();
    for id in ast.descendants(start) {
        for feature in ast.features_of(id) {
            if feature.optional && !features.contains(&feature) {
                features.push(feature);
            }
        }
    }
    features
}
