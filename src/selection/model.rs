//! Selection model driving the tree view
//!
//! Holds the persistent overlays (marks, blacklist overrides, expansion)
//! together with the page cache of what is currently rendered. Every bulk
//! operation is a [`walk_breadth_first`] with a blacklist-aware descend
//! predicate.
//!
//! Toggling is two-phase: [`SelectionModel::propose`] decides whether the
//! change needs consent, the caller obtains a [`Decision`], and
//! [`SelectionModel::commit`] applies it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;

use super::blacklist::Blacklist;
use super::cache::{CachedPage, PageCache};
use super::state::{AllowOverrides, ExpandState, Mark, SelectionState};
use super::store::PersistedSelection;
use super::tristate::{TriState, TriStateView};
use super::walk::{walk_breadth_first, TreeSource};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{PromptreeError, Result};
use crate::types::{ChildPage, Node};
use crate::{bail, ensure};

/// Answer to a consent request for a blacklisted path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Grant,
    Deny,
}

impl From<bool> for Decision {
    fn from(granted: bool) -> Self {
        if granted {
            Decision::Grant
        } else {
            Decision::Deny
        }
    }
}

/// Source of consent decisions (an interactive prompt, a flag, a test stub)
pub trait Consent {
    fn confirm(&mut self, path: &Path) -> Decision;
}

impl<F> Consent for F
where
    F: FnMut(&Path) -> Decision,
{
    fn confirm(&mut self, path: &Path) -> Decision {
        self(path)
    }
}

/// A requested checkbox change, not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub target: PathBuf,
    pub is_dir: bool,
    pub checked: bool,
}

/// Result of the first phase of a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// Can be committed as is
    Ready(PendingChange),
    /// Selecting a blacklisted path without an override
    NeedsConsent(PendingChange),
}

impl Proposal {
    pub fn change(&self) -> &PendingChange {
        match self {
            Proposal::Ready(change) | Proposal::NeedsConsent(change) => change,
        }
    }
}

/// Result of committing a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Number of paths whose mark was written
    Applied { marked: usize },
    /// Consent was refused; nothing changed
    Declined,
}

#[derive(Debug, Clone)]
pub struct SelectionModel {
    root: PathBuf,
    state: SelectionState,
    allow: AllowOverrides,
    expanded: ExpandState,
    cache: PageCache,
    blacklist: Blacklist,
    /// Children a previous session had loaded, restored by `render_visible`
    loaded: BTreeMap<PathBuf, usize>,
    page_size: usize,
    progress: Arc<ProgressBar>,
}

impl SelectionModel {
    /// Empty selection rooted at `root` (expected to be canonical)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            blacklist: Blacklist::new(root.clone()),
            root,
            state: SelectionState::default(),
            allow: AllowOverrides::default(),
            expanded: ExpandState::default(),
            cache: PageCache::default(),
            loaded: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            progress: Arc::new(ProgressBar::hidden()),
        }
    }

    pub fn from_persisted(root: impl Into<PathBuf>, persisted: PersistedSelection) -> Self {
        let mut model = Self::new(root);
        model.state = persisted.checked;
        model.expanded = persisted.expanded;
        model.allow = persisted.allow;
        model.loaded = persisted.loaded;
        model
    }

    pub fn to_persisted(&self) -> PersistedSelection {
        let mut loaded = self.loaded.clone();
        for (dir, page) in self.cache.iter() {
            if page.offset_loaded > self.page_size {
                loaded.insert(dir.to_path_buf(), page.offset_loaded);
            } else {
                loaded.remove(dir);
            }
        }

        PersistedSelection {
            checked: self.state.clone(),
            expanded: self.expanded.clone(),
            allow: self.allow.clone(),
            loaded,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.set_progress(progress);
        self
    }

    /// Progress bar ticked once per node visited by a walk
    pub fn set_progress(&mut self, progress: Arc<ProgressBar>) {
        self.progress = progress;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn allow(&self) -> &AllowOverrides {
        &self.allow
    }

    pub fn expanded(&self) -> &ExpandState {
        &self.expanded
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    /// Resolve a user-supplied path inside the root, reporting whether it is
    /// a directory
    pub fn locate(&self, path: &Path) -> Result<(PathBuf, bool)> {
        let resolved = crate::utils::resolve_within(&self.root, path)
            .ok_or_else(|| PromptreeError::InvalidPath(path.display().to_string()))?;
        let is_dir = resolved.is_dir();
        Ok((resolved, is_dir))
    }

    /// Whether bulk operations may include `path`
    pub fn is_permitted(&self, path: &Path) -> bool {
        self.blacklist.permits(path, &self.allow)
    }

    pub fn tristate(&self) -> TriStateView<'_> {
        TriStateView::new(&self.root, &self.state, &self.cache)
    }

    /// Checkbox state of a path as currently rendered
    pub fn state_of(&self, path: &Path, is_dir: bool) -> TriState {
        let view = self.tristate();
        if is_dir {
            view.dir_state(path)
        } else if self.state.get(path) == Some(Mark::File) {
            TriState::Checked
        } else {
            TriState::Unchecked
        }
    }

    /// First phase of a toggle
    pub fn propose(&self, target: &Path, is_dir: bool, checked: bool) -> Result<Proposal> {
        ensure!(
            target.starts_with(&self.root),
            InvalidPath,
            "{} is outside {}",
            target.display(),
            self.root.display()
        );

        let change = PendingChange {
            target: target.to_path_buf(),
            is_dir,
            checked,
        };
        if checked && !self.is_permitted(target) {
            Ok(Proposal::NeedsConsent(change))
        } else {
            Ok(Proposal::Ready(change))
        }
    }

    /// Second phase of a toggle
    pub fn commit<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        proposal: Proposal,
        decision: Decision,
    ) -> Result<Outcome> {
        let change = match (proposal, decision) {
            (Proposal::Ready(change), _) => change,
            (Proposal::NeedsConsent(change), Decision::Grant) => {
                log::info!("Allowing blacklisted path {}", change.target.display());
                self.allow.grant(change.target.clone());
                change
            }
            (Proposal::NeedsConsent(change), Decision::Deny) => {
                log::debug!("Consent denied for {}", change.target.display());
                return Ok(Outcome::Declined);
            }
        };

        let marked = if change.is_dir {
            self.set_subtree(source, &change.target, change.checked)?
        } else {
            self.state
                .set(change.target, Mark::for_toggle(false, change.checked));
            1
        };
        Ok(Outcome::Applied { marked })
    }

    /// Propose, ask for consent when needed, then commit
    pub fn toggle<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        target: &Path,
        is_dir: bool,
        checked: bool,
        consent: &mut dyn Consent,
    ) -> Result<Outcome> {
        let proposal = self.propose(target, is_dir, checked)?;
        let decision = match &proposal {
            Proposal::Ready(_) => Decision::Grant,
            Proposal::NeedsConsent(change) => consent.confirm(&change.target),
        };
        self.commit(source, proposal, decision)
    }

    /// Mark a directory and every descendant
    ///
    /// Selecting skips blacklisted descendants without an override and does
    /// not descend into them. Deselecting excludes everything below.
    pub fn set_subtree<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        dir: &Path,
        checked: bool,
    ) -> Result<usize> {
        self.state.set(dir, Mark::for_toggle(true, checked));
        self.progress
            .set_message(format!("Walking {}", dir.display()));

        let mut marks = Vec::new();
        {
            let blacklist = &self.blacklist;
            let allow = &self.allow;
            let progress = &self.progress;
            walk_breadth_first(
                source,
                dir,
                self.page_size,
                |node| !checked || blacklist.permits(&node.absolute_path, allow),
                |_, node| {
                    progress.inc(1);
                    if checked && !blacklist.permits(&node.absolute_path, allow) {
                        log::trace!("Skipping blacklisted {}", node.absolute_path.display());
                        return;
                    }
                    marks.push((
                        node.absolute_path.clone(),
                        Mark::for_toggle(node.is_dir, checked),
                    ));
                },
            )?;
        }

        let marked = marks.len() + 1;
        for (path, mark) in marks {
            self.state.set(path, mark);
        }
        log::debug!(
            "{} {} paths under {}",
            if checked { "Selected" } else { "Excluded" },
            marked,
            dir.display()
        );
        Ok(marked)
    }

    /// Select every permitted entry of the whole tree
    pub fn select_all<S: TreeSource + ?Sized>(&mut self, source: &S) -> Result<usize> {
        self.progress.set_message("Selecting everything");

        let mut marks = Vec::new();
        {
            let blacklist = &self.blacklist;
            let allow = &self.allow;
            let progress = &self.progress;
            walk_breadth_first(
                source,
                &self.root,
                self.page_size,
                |node| blacklist.permits(&node.absolute_path, allow),
                |_, node| {
                    progress.inc(1);
                    if blacklist.permits(&node.absolute_path, allow) {
                        marks.push((
                            node.absolute_path.clone(),
                            Mark::for_toggle(node.is_dir, true),
                        ));
                    }
                },
            )?;
        }

        let marked = marks.len();
        for (path, mark) in marks {
            self.state.set(path, mark);
        }
        Ok(marked)
    }

    /// Exclude every rendered entry, dropping all other marks
    ///
    /// Blacklisted entries without an override are left out of the
    /// rebuilt state entirely.
    pub fn unselect_all(&mut self) -> usize {
        let mut rebuilt = SelectionState::default();
        for node in self.cache.nodes() {
            if self.is_permitted(&node.absolute_path) {
                rebuilt.set(node.absolute_path.clone(), Mark::Excluded);
            }
        }
        self.state = rebuilt;
        self.state.len()
    }

    /// Files the snapshot should contain
    ///
    /// Explicitly selected files come first in path order, followed by files
    /// found under selected directories in walk order. Explicit exclusion
    /// always wins, excluded directories are not descended, and blacklisted
    /// paths without an override are left out.
    pub fn effective_files<S: TreeSource + ?Sized>(&self, source: &S) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for path in self.state.with_mark(Mark::File) {
            if self.is_permitted(path) && seen.insert(path.to_path_buf()) {
                files.push(path.to_path_buf());
            }
        }

        let mut walked: HashSet<PathBuf> = HashSet::new();
        for dir in self.state.with_mark(Mark::Dir) {
            if walked.contains(dir) || !self.is_permitted(dir) {
                continue;
            }
            walked.insert(dir.to_path_buf());

            let result = walk_breadth_first(
                source,
                dir,
                self.page_size,
                |node| {
                    !self.state.is_excluded(&node.absolute_path)
                        && self.is_permitted(&node.absolute_path)
                        && walked.insert(node.absolute_path.clone())
                },
                |_, node| {
                    let path = &node.absolute_path;
                    if !node.is_dir
                        && !self.state.is_excluded(path)
                        && self.is_permitted(path)
                        && seen.insert(path.clone())
                    {
                        files.push(path.clone());
                    }
                },
            );
            if let Err(e) = result {
                log::warn!("Could not collect files under {}: {}", dir.display(), e);
            }
        }

        files
    }

    /// Load the root page and the first page of every expanded directory
    ///
    /// Directories that had more pages loaded when the selection was saved
    /// get those pages back.
    pub fn render_visible<S: TreeSource + ?Sized>(&mut self, source: &S) -> Result<usize> {
        self.cache.clear();
        let first = source.list_children(&self.root, 0, self.page_size)?;
        let root = self.root.clone();
        self.cache.store_first(root.clone(), first);
        self.restore_pages(source, &root);

        let mut pending: Vec<PathBuf> = self.expanded_children_of(&self.root);
        let mut loaded = 1;
        while let Some(dir) = pending.pop() {
            match source.list_children(&dir, 0, self.page_size) {
                Ok(page) => {
                    self.cache.store_first(dir.clone(), page);
                    self.restore_pages(source, &dir);
                    loaded += 1;
                    pending.extend(self.expanded_children_of(&dir));
                }
                Err(e) => log::warn!("Could not render {}: {}", dir.display(), e),
            }
        }
        Ok(loaded)
    }

    fn restore_pages<S: TreeSource + ?Sized>(&mut self, source: &S, dir: &Path) {
        let Some(&target) = self.loaded.get(dir) else {
            return;
        };
        while let Some(page) = self.cache.get(dir) {
            let before = page.offset_loaded;
            if before >= target || !page.has_more() {
                break;
            }
            match self.cache.load_more(source, dir, self.page_size) {
                Ok(page) if page.offset_loaded > before => {}
                Ok(_) => break,
                Err(e) => {
                    log::warn!("Could not restore pages of {}: {}", dir.display(), e);
                    break;
                }
            }
        }
    }

    fn expanded_children_of(&self, dir: &Path) -> Vec<PathBuf> {
        self.cache
            .get(dir)
            .map(|page| {
                page.children
                    .iter()
                    .filter(|n| n.is_dir && self.expanded.is_expanded(&n.absolute_path))
                    .map(|n| n.absolute_path.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fetch and append the next page of `dir`
    pub fn load_more<S: TreeSource + ?Sized>(&mut self, source: &S, dir: &Path) -> Result<&CachedPage> {
        self.cache.load_more(source, dir, self.page_size)
    }

    /// Expand or collapse a directory; expanding loads its first page once
    pub fn set_expanded<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        dir: &Path,
        expanded: bool,
    ) -> Result<()> {
        self.expanded.set(dir, expanded);
        if expanded && !self.cache.contains(dir) {
            let page = source.list_children(dir, 0, self.page_size)?;
            self.cache.store_first(dir, page);
        }
        Ok(())
    }

    pub fn toggle_expanded<S: TreeSource + ?Sized>(&mut self, source: &S, dir: &Path) -> Result<bool> {
        let expanded = !self.expanded.is_expanded(dir);
        self.set_expanded(source, dir, expanded)?;
        Ok(expanded)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Load every page of every permitted directory and expand it
    ///
    /// Directories listed before the deadline stay loaded even when the
    /// deadline is exceeded, which is reported as [`PromptreeError::Timeout`].
    pub fn expand_all<S: TreeSource + ?Sized>(&mut self, source: &S, deadline: Instant) -> Result<usize> {
        let mut opened: Vec<PathBuf> = vec![self.root.clone()];
        let mut listed: BTreeMap<PathBuf, Vec<Node>> = BTreeMap::new();
        let mut timed_out = false;
        {
            let blacklist = &self.blacklist;
            let allow = &self.allow;
            let progress = &self.progress;
            walk_breadth_first(
                source,
                &self.root,
                self.page_size,
                |node| {
                    if Instant::now() > deadline {
                        timed_out = true;
                        return false;
                    }
                    if !blacklist.permits(&node.absolute_path, allow) {
                        return false;
                    }
                    opened.push(node.absolute_path.clone());
                    true
                },
                |dir, node| {
                    progress.inc(1);
                    listed
                        .entry(dir.to_path_buf())
                        .or_default()
                        .push(node.clone());
                },
            )?;
        }

        for dir in &opened {
            let children = listed.remove(dir).unwrap_or_default();
            let total = children.len();
            self.cache.store_first(
                dir.clone(),
                ChildPage {
                    children,
                    offset: 0,
                    limit: total,
                    total,
                    has_more: false,
                },
            );
            if dir != &self.root {
                self.expanded.set(dir.clone(), true);
            }
        }

        if timed_out {
            bail!(
                Timeout,
                "expanding {} did not finish in time ({} directories loaded)",
                self.root.display(),
                opened.len()
            );
        }
        Ok(opened.len())
    }
}
