//! Command/observer surface of the evidence viewer
//!
//! The hosting shell issues commands (`navigate_to_page`,
//! `set_highlight_query`, `jump_to_evidence`), reports render completion
//! and drives the clock with `tick`. The session answers with an observable
//! `ViewerSnapshot` and with `SurfaceUpdate`s describing which rendered
//! segments changed and where to scroll.
//!
//! Sequencing: a render-complete signal or a new request schedules the
//! highlight `apply_delay_ms` later; a successful apply schedules the scroll
//! `scroll_delay_ms` after that. Every page, query or render change bumps
//! the generation, and deferred actions from older generations are dropped
//! when they come due.

use crate::config::ViewerConfig;
use crate::highlight::{resolve_reference, RangeHighlighter, ScrollTarget, TextLayer};
use crate::matcher::{EvidenceMatcher, PreparedBuffer};
use crate::polygon::{BoundingBox, OverlayShape, PolygonProjector};
use crate::schedule::{DeferredQueue, Generation};
use crate::segments::SegmentIndex;
use crate::types::{EvidenceReference, MatchResult, Segment, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Observable state of the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSnapshot {
    /// Current page (1-indexed)
    pub current_page: u32,
    pub page_count: u32,
    /// Active highlight query, if any
    pub query: Option<String>,
    /// Range currently highlighted on the text layer
    pub current_match: Option<MatchResult>,
    pub loaded: bool,
}

/// Changes the shell must mirror onto the rendered surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceUpdate {
    /// Segments whose fragments changed since the last update
    pub changed: Vec<SegmentId>,
    /// Highlighted fragment to bring into view
    pub scroll_to: Option<ScrollTarget>,
}

impl SurfaceUpdate {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.scroll_to.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionAction {
    ApplyHighlight,
    ScrollIntoView,
}

/// Text surface of the page that finished rendering last
struct RenderedPage {
    page: u32,
    index: SegmentIndex,
    buffer: PreparedBuffer,
    layer: TextLayer,
}

type Observer = Box<dyn FnMut(&ViewerSnapshot)>;

/// The viewer core: owns the text layer, the highlight state and the
/// bounding boxes of every page
pub struct ViewerSession {
    config: ViewerConfig,
    matcher: EvidenceMatcher,
    projector: PolygonProjector,
    highlighter: RangeHighlighter,
    page_count: u32,
    current_page: u32,
    request: Option<EvidenceReference>,
    rendered: Option<RenderedPage>,
    boxes: HashMap<u32, Vec<BoundingBox>>,
    generation: Generation,
    queue: DeferredQueue<SessionAction>,
    clock_ms: u64,
    changed: BTreeSet<SegmentId>,
    scroll_to: Option<ScrollTarget>,
    observers: Vec<Observer>,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            matcher: EvidenceMatcher::new(config.matcher.clone()),
            projector: PolygonProjector::new(config.overlay.clone()),
            config,
            highlighter: RangeHighlighter::new(),
            page_count: 0,
            current_page: 1,
            request: None,
            rendered: None,
            boxes: HashMap::new(),
            generation: Generation::default(),
            queue: DeferredQueue::new(),
            clock_ms: 0,
            changed: BTreeSet::new(),
            scroll_to: None,
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Register an observer, called after every state change
    pub fn subscribe(&mut self, observer: impl FnMut(&ViewerSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            current_page: self.current_page,
            page_count: self.page_count,
            query: self.request.as_ref().map(|r| r.quote.clone()),
            current_match: self.highlighter.active().map(|a| a.result.clone()),
            loaded: self.is_loaded(),
        }
    }

    /// Whether a document with at least one page is loaded
    pub fn is_loaded(&self) -> bool {
        self.page_count > 0
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// The text layer of the last rendered page
    pub fn text_layer(&self) -> Option<&TextLayer> {
        self.rendered.as_ref().map(|r| &r.layer)
    }

    /// Pending deferred actions, including stale ones
    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    /// Load a new document with `page_count` pages
    ///
    /// Everything tied to the previous document goes: its text layer,
    /// highlight request, bounding boxes and pending actions. The viewer
    /// starts again on page 1.
    pub fn set_page_count(&mut self, page_count: u32) {
        self.highlighter = RangeHighlighter::new();
        self.rendered = None;
        self.request = None;
        self.boxes.clear();
        self.changed.clear();
        self.scroll_to = None;
        self.page_count = page_count;
        self.current_page = 1;
        self.bump_generation();
        tracing::debug!(page_count, "document loaded");
        self.notify();
    }

    /// Move to another page; its text layer is replaced on the next render
    pub fn navigate_to_page(&mut self, page: u32) {
        if self.move_to_page(page) {
            self.notify();
        }
    }

    /// Replace the highlight query; an empty query removes the highlight
    pub fn set_highlight_query(&mut self, text: &str) {
        self.clear_highlight();
        self.bump_generation();

        if text.trim().is_empty() {
            self.request = None;
        } else {
            self.request = Some(EvidenceReference::from_quote(self.current_page, text));
            self.schedule(SessionAction::ApplyHighlight, self.config.timing.apply_delay_ms);
        }
        self.notify();
    }

    /// Show a piece of evidence: go to its page and highlight it there
    pub fn jump_to_evidence(&mut self, reference: EvidenceReference) {
        if !self.page_in_range(reference.page) {
            tracing::debug!(
                page = reference.page,
                page_count = self.page_count,
                "evidence page out of range, ignored"
            );
            return;
        }
        self.move_to_page(reference.page);
        self.request = Some(reference);

        self.clear_highlight();
        self.bump_generation();
        self.schedule(SessionAction::ApplyHighlight, self.config.timing.apply_delay_ms);
        self.notify();
    }

    /// The host finished rendering `page` with these text segments
    pub fn render_complete(&mut self, page: u32, segments: &[Segment], now_ms: u64) {
        self.advance_clock(now_ms);
        if page != self.current_page {
            tracing::debug!(page, current = self.current_page, "stale render ignored");
            return;
        }

        let index = SegmentIndex::build(segments);
        let buffer = PreparedBuffer::new(index.text());
        let layer = TextLayer::new(segments);

        // The surface was rebuilt, so the old highlight no longer exists on it
        self.highlighter = RangeHighlighter::new();
        self.rendered = Some(RenderedPage {
            page,
            index,
            buffer,
            layer,
        });
        self.bump_generation();

        if self.request.is_some() {
            self.schedule(SessionAction::ApplyHighlight, self.config.timing.apply_delay_ms);
        }
        self.notify();
    }

    /// Replace the bounding boxes shown on `page`
    pub fn set_bounding_boxes(&mut self, page: u32, boxes: Vec<BoundingBox>) {
        self.boxes.insert(page, boxes);
    }

    /// Project the current page's boxes onto a canvas of the given size
    pub fn overlay_shapes(&self, canvas_width_px: f64, canvas_height_px: f64) -> Vec<OverlayShape> {
        match self.boxes.get(&self.current_page) {
            Some(boxes) => self
                .projector
                .project_boxes(boxes, canvas_width_px, canvas_height_px),
            None => Vec::new(),
        }
    }

    /// Advance the clock, run due actions and return the pending surface changes
    pub fn tick(&mut self, now_ms: u64) -> SurfaceUpdate {
        self.advance_clock(now_ms);

        for deferred in self.queue.take_due(self.clock_ms) {
            if deferred.generation != self.generation {
                tracing::trace!(action = ?deferred.action, "stale deferred action dropped");
                continue;
            }
            match deferred.action {
                SessionAction::ApplyHighlight => self.apply_highlight(),
                SessionAction::ScrollIntoView => {
                    self.scroll_to = self.highlighter.active().map(|a| a.scroll_target);
                }
            }
        }

        self.take_surface_update()
    }

    /// Drain the segment changes and scroll request accumulated so far
    pub fn take_surface_update(&mut self) -> SurfaceUpdate {
        SurfaceUpdate {
            changed: std::mem::take(&mut self.changed).into_iter().collect(),
            scroll_to: self.scroll_to.take(),
        }
    }

    fn apply_highlight(&mut self) {
        let Some(request) = self.request.as_ref() else {
            return;
        };
        let Some(rendered) = self.rendered.as_mut() else {
            tracing::debug!("text layer not rendered, highlight deferred to next render");
            return;
        };

        // Offsets only describe the page they were extracted from
        let reference = if request.page == rendered.page {
            request.clone()
        } else {
            EvidenceReference::from_quote(rendered.page, request.quote.clone())
        };

        let Some(result) = resolve_reference(&reference, &rendered.buffer, &self.matcher) else {
            return;
        };

        self.changed.extend(self.highlighter.clear(&mut rendered.layer));
        let applied = self
            .highlighter
            .apply(&mut rendered.layer, &rendered.index, &result)
            .map(|active| active.touched.clone());

        if let Some(touched) = applied {
            self.changed.extend(touched);
            self.schedule(SessionAction::ScrollIntoView, self.config.timing.scroll_delay_ms);
            self.notify();
        }
    }

    fn page_in_range(&self, page: u32) -> bool {
        page != 0 && (!self.is_loaded() || page <= self.page_count)
    }

    /// Switch pages without notifying; returns whether the page changed
    fn move_to_page(&mut self, page: u32) -> bool {
        if !self.page_in_range(page) {
            tracing::debug!(page, page_count = self.page_count, "page out of range, ignored");
            return false;
        }
        if page == self.current_page {
            return false;
        }

        self.clear_highlight();
        self.rendered = None;
        self.current_page = page;
        self.bump_generation();
        tracing::debug!(page, "navigated");
        true
    }

    fn clear_highlight(&mut self) {
        if let Some(rendered) = self.rendered.as_mut() {
            self.changed.extend(self.highlighter.clear(&mut rendered.layer));
        }
        self.scroll_to = None;
    }

    fn schedule(&mut self, action: SessionAction, delay_ms: u64) {
        self.queue
            .schedule(action, self.generation, self.clock_ms, delay_ms);
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.next();
    }

    fn advance_clock(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}
