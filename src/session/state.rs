// src/session/state.rs
// =============================================================================
// Browsing state for one viewer: which repository is open, its files, the
// selected document, filters and loading indicators.
//
// Loads are two-step. `load_repository` / `begin_files` / `select_file`
// hand out a Ticket and flip the matching loading flag; the caller does the
// network call and reports back with `finish_*(ticket, result)`.
//
// Each slot (repository, files, content) has its own generation counter.
// A completion whose ticket is older than the slot's current generation is
// dropped, so a slow response for an abandoned selection can't overwrite
// what the user is looking at now.
// =============================================================================

use tracing::debug;

use crate::filters::{apply_filters, find_preset, FilterOptions, FilterResult};
use crate::github::{FileContent, MarkdownFile, RepositoryMetadata};
use crate::markdown::{generate_toc, heading_ids, RenderContext, TocItem};

use super::errors::{ErrorDetails, Severity};
use super::input::RepoRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Repository,
    Files,
    Content,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::Repository => 0,
            Slot::Files => 1,
            Slot::Content => 2,
        }
    }
}

/// Proof that a load was started; must be handed back to finish it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

impl Ticket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loading {
    pub repository: bool,
    pub files: bool,
    pub content: bool,
}

impl Loading {
    fn set(&mut self, slot: Slot, value: bool) {
        match slot {
            Slot::Repository => self.repository = value,
            Slot::Files => self.files = value,
            Slot::Content => self.content = value,
        }
    }

    pub fn any(&self) -> bool {
        self.repository || self.files || self.content
    }
}

/// The open file plus everything derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file: FileContent,
    pub toc: Vec<TocItem>,
    /// Flattened TOC ids, what the scroll spy watches
    pub heading_ids: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Session {
    target: Option<RepoRef>,
    metadata: Option<RepositoryMetadata>,
    files: Vec<MarkdownFile>,
    selected: Option<String>,
    document: Option<Document>,

    include: String,
    exclude: String,
    case_sensitive: bool,

    loading: Loading,
    generations: [u64; 3],
    error: Option<ErrorDetails>,
    notice: Option<ErrorDetails>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, slot: Slot) -> Ticket {
        let generation = &mut self.generations[slot.index()];
        *generation += 1;
        self.loading.set(slot, true);
        Ticket {
            slot,
            generation: *generation,
        }
    }

    // Bumps the generation without starting a load, orphaning whatever
    // is in flight for that slot.
    fn abandon(&mut self, slot: Slot) {
        self.generations[slot.index()] += 1;
        self.loading.set(slot, false);
    }

    fn is_current(&self, ticket: Ticket, expected: Slot) -> bool {
        let current = ticket.slot == expected
            && ticket.generation == self.generations[expected.index()];
        if !current {
            debug!(slot = ?ticket.slot, generation = ticket.generation, "ignoring stale completion");
        }
        current
    }

    // ---- repository ---------------------------------------------------------

    /// Start opening `target`. Everything from the previous repository is
    /// dropped right away.
    pub fn load_repository(&mut self, target: RepoRef) -> Ticket {
        self.abandon(Slot::Files);
        self.abandon(Slot::Content);
        self.target = Some(target);
        self.metadata = None;
        self.files.clear();
        self.selected = None;
        self.document = None;
        self.error = None;
        self.notice = None;
        self.issue(Slot::Repository)
    }

    /// Returns false if the ticket was stale and nothing changed
    pub fn finish_repository(
        &mut self,
        ticket: Ticket,
        result: Result<RepositoryMetadata, ErrorDetails>,
    ) -> bool {
        if !self.is_current(ticket, Slot::Repository) {
            return false;
        }
        self.loading.repository = false;
        match result {
            Ok(metadata) => self.metadata = Some(metadata),
            Err(details) => self.error = Some(details),
        }
        true
    }

    // ---- files --------------------------------------------------------------

    pub fn begin_files(&mut self) -> Ticket {
        self.issue(Slot::Files)
    }

    pub fn finish_files(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<MarkdownFile>, ErrorDetails>,
    ) -> bool {
        if !self.is_current(ticket, Slot::Files) {
            return false;
        }
        self.loading.files = false;
        match result {
            Ok(files) => {
                self.notice = files.is_empty().then(|| ErrorDetails {
                    message: "No Markdown files found in this repository".to_string(),
                    suggestion: Some("Try another branch or repository.".to_string()),
                    severity: Severity::Info,
                });
                self.files = files;
            }
            Err(details) => self.error = Some(details),
        }
        true
    }

    // ---- content ------------------------------------------------------------

    /// Select `path` and start loading it. The previous document is cleared
    /// so the old TOC never shows next to the new file.
    pub fn select_file(&mut self, path: &str) -> Ticket {
        self.selected = Some(path.to_string());
        self.document = None;
        self.error = None;
        self.issue(Slot::Content)
    }

    pub fn finish_content(
        &mut self,
        ticket: Ticket,
        result: Result<FileContent, ErrorDetails>,
    ) -> bool {
        if !self.is_current(ticket, Slot::Content) {
            return false;
        }
        self.loading.content = false;
        match result {
            Ok(file) => {
                let toc = generate_toc(&file.content);
                let heading_ids = heading_ids(&toc);
                self.document = Some(Document {
                    file,
                    toc,
                    heading_ids,
                });
            }
            Err(details) => self.error = Some(details),
        }
        true
    }

    // ---- filters ------------------------------------------------------------

    pub fn set_include(&mut self, pattern: &str) {
        self.include = pattern.to_string();
    }

    pub fn set_exclude(&mut self, pattern: &str) {
        self.exclude = pattern.to_string();
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    /// Returns false for an unknown preset key
    pub fn apply_preset(&mut self, key: &str) -> bool {
        match find_preset(key) {
            Some(preset) => {
                self.include = preset.include.to_string();
                self.exclude = preset.exclude.to_string();
                true
            }
            None => false,
        }
    }

    pub fn clear_filters(&mut self) {
        self.include.clear();
        self.exclude.clear();
        self.case_sensitive = false;
    }

    pub fn has_filters(&self) -> bool {
        !self.include.trim().is_empty() || !self.exclude.trim().is_empty()
    }

    /// The file list after include/exclude, plus the pattern error if any
    pub fn visible_files(&self) -> FilterResult {
        apply_filters(
            &self.files,
            &self.include,
            &self.exclude,
            FilterOptions {
                case_sensitive: self.case_sensitive,
            },
        )
    }

    // ---- accessors ----------------------------------------------------------

    pub fn target(&self) -> Option<&RepoRef> {
        self.target.as_ref()
    }

    pub fn metadata(&self) -> Option<&RepositoryMetadata> {
        self.metadata.as_ref()
    }

    /// Explicit ref if one was given, else the default branch once known
    pub fn effective_ref(&self) -> Option<&str> {
        self.target
            .as_ref()
            .and_then(|t| t.git_ref.as_deref())
            .or_else(|| self.metadata.as_ref().map(|m| m.default_branch.as_str()))
    }

    pub fn files(&self) -> &[MarkdownFile] {
        &self.files
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Everything the renderer needs for the open document
    pub fn render_context(&self) -> Option<RenderContext<'_>> {
        let target = self.target.as_ref()?;
        let document = self.document.as_ref()?;
        Some(RenderContext {
            owner: &target.owner,
            repo: &target.repo,
            path: &document.file.path,
            git_ref: self.effective_ref(),
        })
    }

    pub fn loading(&self) -> Loading {
        self.loading
    }

    pub fn error(&self) -> Option<&ErrorDetails> {
        self.error.as_ref()
    }

    pub fn notice(&self) -> Option<&ErrorDetails> {
        self.notice.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
