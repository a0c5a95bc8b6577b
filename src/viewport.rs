use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::LayoutOptions;
use crate::ir::NodeRef;
use crate::layout::{Bounds, LayoutResult};

/// The canvas that draws the diagram. Only the reframing call is needed here.
pub trait ViewportSurface: Send + Sync {
    fn fit_view(&self, bounds: Bounds, options: &serde_json::Value);
}

/// Asks the surface to reframe on a fresh layout once its geometry had time to
/// settle.
#[derive(Clone)]
pub struct ViewportCoordinator {
    surface: Arc<dyn ViewportSurface>,
}

impl ViewportCoordinator {
    pub fn new(surface: Arc<dyn ViewportSurface>) -> Self {
        Self { surface }
    }

    /// Schedules `fit_view` after `options.settle_delay` when `options.fit_view`
    /// is set and the layout placed at least one node. The returned handle may be
    /// dropped; the call still happens.
    pub fn after_layout(
        &self,
        result: &LayoutResult,
        nodes: &[NodeRef],
        options: &LayoutOptions,
    ) -> Option<JoinHandle<()>> {
        if !options.fit_view {
            return None;
        }
        let bounds = result.bounds(nodes)?;
        let surface = Arc::clone(&self.surface);
        let fit_options = options.fit_view_options.clone();
        let delay = options.settle_delay;
        Some(std::thread::spawn(move || {
            if delay > Duration::ZERO {
                std::thread::sleep(delay);
            }
            tracing::debug!(
                width = bounds.width(),
                height = bounds.height(),
                "fitting viewport to layout"
            );
            surface.fit_view(bounds, &fit_options);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EdgeRef;
    use crate::layout::compute_layout;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Mutex<Vec<(Bounds, serde_json::Value)>>,
    }

    impl ViewportSurface for RecordingSurface {
        fn fit_view(&self, bounds: Bounds, options: &serde_json::Value) {
            self.calls.lock().unwrap().push((bounds, options.clone()));
        }
    }

    fn sample() -> (Vec<NodeRef>, Vec<EdgeRef>) {
        let nodes = vec![
            NodeRef::new("a").with_dimensions(100.0, 40.0),
            NodeRef::new("b").with_dimensions(100.0, 40.0),
        ];
        (nodes, vec![EdgeRef::new("a", "b")])
    }

    #[test]
    fn fits_view_with_pass_through_options() {
        let (nodes, edges) = sample();
        let options = LayoutOptions {
            fit_view: true,
            fit_view_options: serde_json::json!({ "padding": 0.1 }),
            settle_delay: Duration::from_millis(1),
            ..LayoutOptions::default()
        };
        let result = compute_layout(&nodes, &edges, &options);
        let surface = Arc::new(RecordingSurface::default());
        let coordinator = ViewportCoordinator::new(surface.clone());
        let handle = coordinator
            .after_layout(&result, &nodes, &options)
            .expect("fit scheduled");
        handle.join().unwrap();

        let calls = surface.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, result.bounds(&nodes).unwrap());
        assert_eq!(calls[0].1["padding"], serde_json::json!(0.1));
    }

    #[test]
    fn skipped_when_disabled_or_empty() {
        let (nodes, edges) = sample();
        let surface = Arc::new(RecordingSurface::default());
        let coordinator = ViewportCoordinator::new(surface.clone());

        let disabled = LayoutOptions::default();
        let result = compute_layout(&nodes, &edges, &disabled);
        assert!(coordinator.after_layout(&result, &nodes, &disabled).is_none());

        let enabled = LayoutOptions {
            fit_view: true,
            ..LayoutOptions::default()
        };
        let empty = compute_layout(&[], &[], &enabled);
        assert!(coordinator.after_layout(&empty, &[], &enabled).is_none());
        assert!(surface.calls.lock().unwrap().is_empty());
    }
}
