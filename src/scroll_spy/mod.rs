// src/scroll_spy/mod.rs
// =============================================================================
// Tracks which heading of the open document is "active" (topmost visible).
//
// The viewport (whatever draws the document) reports intersection changes
// asynchronously through an `IntersectionSink`; nothing here polls. The
// active id is published on a tokio watch channel so any number of views
// can follow it.
//
// Lifecycle:
//   ScrollSpy::new(viewport, options)
//   set_headings(ids, fragment)   every time a new document is shown
//   dispose() / drop              tears the observation down
//
// Every (re)subscription bumps a generation. A sink handed out for an older
// generation keeps working as a value but its deliveries are ignored, so
// late batches from a previous document can't move the highlight.
// =============================================================================

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Clearance for the fixed header when jumping to a heading, in pixels
pub const HEADER_OFFSET: f64 = 80.0;
/// Shrinks the observed band to the middle of the screen
pub const DEFAULT_ROOT_MARGIN: &str = "-20% 0px -35% 0px";
pub const DEFAULT_THRESHOLDS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct SpyOptions {
    pub root_margin: String,
    pub thresholds: Vec<f64>,
    pub header_offset: f64,
}

impl Default for SpyOptions {
    fn default() -> Self {
        SpyOptions {
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            header_offset: HEADER_OFFSET,
        }
    }
}

/// One heading's visibility change
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
    /// Distance from the top of the viewport; negative once scrolled past
    pub top: f64,
}

/// Where `navigate` scrolled to
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTarget {
    pub id: String,
    pub y: f64,
}

/// A live observation; disconnecting stops all further notifications
pub trait Observation: Send {
    fn disconnect(&mut self);
}

/// The surface the document is drawn on
pub trait Viewport {
    /// Start watching the elements with `ids`, reporting batches to `sink`
    fn observe(
        &mut self,
        ids: &[String],
        options: &SpyOptions,
        sink: IntersectionSink,
    ) -> Box<dyn Observation>;

    /// Top of the element relative to the viewport, None if it isn't there
    fn element_top(&self, id: &str) -> Option<f64>;

    fn scroll_y(&self) -> f64;

    fn smooth_scroll_to(&mut self, y: f64);

    /// Rewrite the location fragment in place (no navigation)
    fn replace_fragment(&mut self, id: &str);
}

struct Shared {
    generation: Mutex<u64>,
    active: watch::Sender<Option<String>>,
}

/// Handed to the viewport; cheap to clone and safe to call from any thread
#[derive(Clone)]
pub struct IntersectionSink {
    shared: Weak<Shared>,
    generation: u64,
}

impl IntersectionSink {
    /// Feed one batch of notifications. Returns true if the active id
    /// changed.
    pub fn deliver(&self, entries: &[IntersectionEntry]) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        // Held across the update so a concurrent resubscribe can't slip in
        let generation = shared.generation.lock();
        if *generation != self.generation {
            return false;
        }

        shared.active.send_if_modified(|active| {
            let next = select_active(entries, active.as_deref());
            if next.as_deref() == active.as_deref() {
                return false;
            }
            *active = next;
            true
        })
    }
}

/// Topmost intersecting entry wins; with nothing intersecting the previous
/// id stays so the highlight doesn't flicker off.
pub fn select_active(entries: &[IntersectionEntry], previous: Option<&str>) -> Option<String> {
    entries
        .iter()
        .filter(|e| e.is_intersecting)
        .min_by(|a, b| a.top.total_cmp(&b.top))
        .map(|e| e.id.clone())
        .or_else(|| previous.map(String::from))
}

/// Document y that puts a heading just under the fixed header
pub fn scroll_target(heading_top: f64, scroll_y: f64, header_offset: f64) -> f64 {
    heading_top + scroll_y - header_offset
}

pub struct ScrollSpy<V: Viewport> {
    viewport: V,
    options: SpyOptions,
    shared: Arc<Shared>,
    observation: Option<Box<dyn Observation>>,
    ids: Vec<String>,
}

impl<V: Viewport> ScrollSpy<V> {
    pub fn new(viewport: V, options: SpyOptions) -> Self {
        let (active, _) = watch::channel(None);
        ScrollSpy {
            viewport,
            options,
            shared: Arc::new(Shared {
                generation: Mutex::new(0),
                active,
            }),
            observation: None,
            ids: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.shared.active.subscribe()
    }

    pub fn active_id(&self) -> Option<String> {
        self.shared.active.borrow().clone()
    }

    pub fn heading_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    // Bumps the generation first so anything the old observation delivers
    // while disconnecting is already stale.
    fn teardown(&mut self) -> u64 {
        let generation = {
            let mut generation = self.shared.generation.lock();
            *generation += 1;
            *generation
        };
        if let Some(mut observation) = self.observation.take() {
            observation.disconnect();
        }
        generation
    }

    /// Watch a new heading list. `fragment` (with or without '#') seeds the
    /// active id when it names one of the headings.
    pub fn set_headings(&mut self, ids: Vec<String>, fragment: Option<&str>) {
        let generation = self.teardown();
        self.ids = ids;

        let fragment = fragment
            .map(|f| f.trim_start_matches('#'))
            .filter(|f| self.ids.iter().any(|id| id.as_str() == *f));
        let ids = &self.ids;
        self.shared.active.send_if_modified(|active| {
            let next = match fragment {
                Some(f) => Some(f.to_string()),
                // Keep the old id only if it still exists
                None => active.clone().filter(|id| ids.contains(id)),
            };
            let changed = next != *active;
            *active = next;
            changed
        });

        if self.ids.is_empty() {
            debug!("no headings to observe");
            return;
        }

        debug!(count = self.ids.len(), generation, "observing headings");
        let sink = IntersectionSink {
            shared: Arc::downgrade(&self.shared),
            generation,
        };
        self.observation = Some(self.viewport.observe(&self.ids, &self.options, sink));
    }

    /// Scroll to a heading and put its id in the fragment. None if the
    /// heading isn't on the page.
    pub fn navigate(&mut self, id: &str) -> Option<ScrollTarget> {
        let top = self.viewport.element_top(id)?;
        let y = scroll_target(top, self.viewport.scroll_y(), self.options.header_offset);
        self.viewport.smooth_scroll_to(y);
        self.viewport.replace_fragment(id);
        Some(ScrollTarget {
            id: id.to_string(),
            y,
        })
    }

    /// Stop observing. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.teardown();
        self.ids.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.observation.is_some()
    }
}

impl<V: Viewport> Drop for ScrollSpy<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeViewport {
        sinks: Arc<Mutex<Vec<IntersectionSink>>>,
        live: Arc<AtomicUsize>,
        tops: HashMap<String, f64>,
        scroll_y: f64,
        scrolled_to: Vec<f64>,
        fragment: Option<String>,
    }

    struct FakeObservation {
        live: Arc<AtomicUsize>,
        connected: bool,
    }

    impl Observation for FakeObservation {
        fn disconnect(&mut self) {
            if self.connected {
                self.connected = false;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl Viewport for FakeViewport {
        fn observe(
            &mut self,
            _ids: &[String],
            _options: &SpyOptions,
            sink: IntersectionSink,
        ) -> Box<dyn Observation> {
            self.sinks.lock().push(sink);
            self.live.fetch_add(1, Ordering::SeqCst);
            Box::new(FakeObservation {
                live: Arc::clone(&self.live),
                connected: true,
            })
        }

        fn element_top(&self, id: &str) -> Option<f64> {
            self.tops.get(id).copied()
        }

        fn scroll_y(&self) -> f64 {
            self.scroll_y
        }

        fn smooth_scroll_to(&mut self, y: f64) {
            self.scrolled_to.push(y);
        }

        fn replace_fragment(&mut self, id: &str) {
            self.fragment = Some(id.to_string());
        }
    }

    fn entry(id: &str, is_intersecting: bool, top: f64) -> IntersectionEntry {
        IntersectionEntry {
            id: id.to_string(),
            is_intersecting,
            top,
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_active() {
        let entries = vec![
            entry("usage", true, 240.0),
            entry("intro", false, -50.0),
            entry("install", true, 120.0),
        ];
        assert_eq!(select_active(&entries, None), Some("install".to_string()));

        let none_visible = vec![entry("intro", false, 10.0)];
        assert_eq!(
            select_active(&none_visible, Some("usage")),
            Some("usage".to_string())
        );
        assert_eq!(select_active(&[], None), None);
    }

    #[test]
    fn test_fragment_seeds_active_id() {
        let mut spy = ScrollSpy::new(FakeViewport::default(), SpyOptions::default());
        spy.set_headings(ids(&["intro", "usage"]), Some("#usage"));
        assert_eq!(spy.active_id(), Some("usage".to_string()));

        // Unknown fragment is ignored
        spy.set_headings(ids(&["a", "b"]), Some("#nope"));
        assert_eq!(spy.active_id(), None);
    }

    #[tokio::test]
    async fn test_async_delivery_updates_subscribers() {
        let viewport = FakeViewport::default();
        let sinks = Arc::clone(&viewport.sinks);
        let mut spy = ScrollSpy::new(viewport, SpyOptions::default());
        let mut rx = spy.subscribe();
        spy.set_headings(ids(&["intro", "install", "usage"]), None);

        let sink = sinks.lock()[0].clone();
        std::thread::spawn(move || {
            sink.deliver(&[entry("usage", true, 300.0), entry("install", true, 100.0)]);
        })
        .join()
        .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_deref(), Some("install"));

        // Nothing visible: keep the last id
        let sink = sinks.lock()[0].clone();
        assert!(!sink.deliver(&[entry("install", false, -20.0)]));
        assert_eq!(spy.active_id(), Some("install".to_string()));
    }

    #[test]
    fn test_resubscribe_ignores_old_sink() {
        let viewport = FakeViewport::default();
        let sinks = Arc::clone(&viewport.sinks);
        let live = Arc::clone(&viewport.live);
        let mut spy = ScrollSpy::new(viewport, SpyOptions::default());

        spy.set_headings(ids(&["a", "b"]), None);
        spy.set_headings(ids(&["c", "d"]), None);
        assert_eq!(live.load(Ordering::SeqCst), 1);

        let (old, new) = {
            let sinks = sinks.lock();
            (sinks[0].clone(), sinks[1].clone())
        };
        assert!(!old.deliver(&[entry("a", true, 0.0)]));
        assert_eq!(spy.active_id(), None);
        assert!(new.deliver(&[entry("d", true, 0.0)]));
        assert_eq!(spy.active_id(), Some("d".to_string()));
    }

    #[test]
    fn test_active_id_cleared_when_heading_disappears() {
        let mut spy = ScrollSpy::new(FakeViewport::default(), SpyOptions::default());
        spy.set_headings(ids(&["a", "b"]), Some("b"));
        spy.set_headings(ids(&["b", "c"]), None);
        assert_eq!(spy.active_id(), Some("b".to_string()));
        spy.set_headings(ids(&["x"]), None);
        assert_eq!(spy.active_id(), None);
    }

    #[test]
    fn test_dispose_and_drop_disconnect() {
        let viewport = FakeViewport::default();
        let sinks = Arc::clone(&viewport.sinks);
        let live = Arc::clone(&viewport.live);
        let mut spy = ScrollSpy::new(viewport, SpyOptions::default());

        spy.set_headings(ids(&["a"]), None);
        spy.dispose();
        spy.dispose();
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(!spy.is_observing());
        assert!(!sinks.lock()[0].deliver(&[entry("a", true, 0.0)]));

        spy.set_headings(ids(&["b"]), None);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        drop(spy);
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(!sinks.lock()[1].deliver(&[entry("b", true, 0.0)]));
    }

    #[test]
    fn test_empty_heading_list_observes_nothing() {
        let viewport = FakeViewport::default();
        let live = Arc::clone(&viewport.live);
        let mut spy = ScrollSpy::new(viewport, SpyOptions::default());
        spy.set_headings(Vec::new(), Some("#intro"));
        assert!(!spy.is_observing());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_navigate_offsets_for_header() {
        let mut viewport = FakeViewport::default();
        viewport.tops.insert("usage".to_string(), 500.0);
        viewport.scroll_y = 1000.0;
        let mut spy = ScrollSpy::new(viewport, SpyOptions::default());

        let target = spy.navigate("usage").unwrap();
        assert_eq!(target.y, 1420.0);
        assert_eq!(spy.viewport().scrolled_to, vec![1420.0]);
        assert_eq!(spy.viewport().fragment.as_deref(), Some("usage"));

        assert_eq!(spy.navigate("missing"), None);
    }
}
