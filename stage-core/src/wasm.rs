//! WebAssembly bindings for stage-core.
//!
//! This module provides JavaScript-callable functions when compiled to WASM.
//! Everything crosses the boundary as JSON: snapshots in, dispatched commands
//! and the scene graph out.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::{
    HeadlessElement, PointerButton, PointerEvent, PointerEventKind, Session, SnapshotStore,
    StageCommand, StageConfig, StageError, StageSnapshot, Viewport,
};

/// Initialize the stage WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Stage instance for WASM.
///
/// Owns the snapshot store and subscribes the viewport to it, so commands
/// produced by pointer input are applied and re-rendered before the call
/// returns.
#[wasm_bindgen]
pub struct WasmStage {
    viewport: Rc<RefCell<Viewport>>,
    store: SnapshotStore,
    container: Rc<HeadlessElement>,
    wrapper: Rc<HeadlessElement>,
}

#[wasm_bindgen]
impl WasmStage {
    /// Create a stage with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails with the default configuration; the signature matches
    /// [`WasmStage::with_config`].
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmStage, String> {
        Self::build(StageConfig::default())
    }

    /// Create a stage from a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is malformed or out of range.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<WasmStage, String> {
        Self::build(StageConfig::from_json(json).map_err(|e| e.to_string())?)
    }

    /// Mount into a container of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error string if the first render fails.
    pub fn mount(&mut self, width: f64, height: f64) -> Result<(), String> {
        self.container.set_size(width, height);
        self.wrapper.set_size(width, height);
        let container = Rc::clone(&self.container);
        let wrapper = Rc::clone(&self.wrapper);
        self.viewport
            .borrow_mut()
            .mount(container, wrapper)
            .map_err(|e| e.to_string())
    }

    /// Unmount, releasing the surface.
    pub fn unmount(&mut self) {
        self.viewport.borrow_mut().unmount();
    }

    /// Whether the stage is mounted.
    #[wasm_bindgen(js_name = isMounted)]
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.viewport.borrow().is_mounted()
    }

    /// Deliver a resize of the wrapper element.
    ///
    /// # Errors
    ///
    /// Returns an error string if re-rendering fails.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), String> {
        self.wrapper.set_size(width, height);
        self.viewport
            .borrow_mut()
            .resize(width, height)
            .map_err(|e| e.to_string())
    }

    /// Publish a new snapshot serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing fails or a pass rejects the
    /// snapshot.
    #[wasm_bindgen(js_name = setSnapshotJson)]
    pub fn set_snapshot_json(&mut self, json: &str) -> Result<(), String> {
        let snapshot = StageSnapshot::from_json(json).map_err(|e| e.to_string())?;
        self.store.publish(snapshot).map_err(|e| e.to_string())
    }

    /// Get the current snapshot as JSON.
    #[wasm_bindgen(js_name = getSnapshotJson)]
    #[must_use]
    pub fn get_snapshot_json(&self) -> String {
        self.store.current().to_json().unwrap_or_default()
    }

    /// Get the mounted surface as JSON, or an empty string when unmounted.
    #[wasm_bindgen(js_name = getSceneJson)]
    #[must_use]
    pub fn get_scene_json(&self) -> String {
        self.viewport
            .borrow()
            .with_surface(serde_json::to_string)
            .and_then(Result::ok)
            .unwrap_or_default()
    }

    /// Deliver a pointer event in physical pixels.
    ///
    /// `kind` is one of `down`, `move`, `up`, `enter`, `leave`, `cancel`;
    /// `button` follows the DOM numbering (0 primary, 1 auxiliary,
    /// 2 secondary). Returns the dispatched commands as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error string if `kind` is unknown or routing fails.
    #[wasm_bindgen(js_name = pointerEvent)]
    pub fn pointer_event(
        &mut self,
        kind: &str,
        x: f64,
        y: f64,
        button: u8,
    ) -> Result<String, String> {
        let kind: PointerEventKind =
            serde_json::from_value(serde_json::Value::String(kind.to_string()))
                .map_err(|e| e.to_string())?;
        let button = match button {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            _ => PointerButton::Secondary,
        };
        let event = PointerEvent::new(kind, x, y).with_button(button);

        let mut commands: Vec<StageCommand> = Vec::new();
        self.viewport
            .borrow_mut()
            .handle_pointer(event, &mut commands)
            .map_err(|e| e.to_string())?;
        self.store
            .dispatch_all(&commands)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&commands).map_err(|e| e.to_string())
    }
}

impl WasmStage {
    fn build(config: StageConfig) -> Result<Self, String> {
        let viewport = Viewport::new(Session::current(), config).map_err(|e| e.to_string())?;
        let viewport = Rc::new(RefCell::new(viewport));
        let mut store = SnapshotStore::new(StageSnapshot::new(0.0, 0.0));
        let subscriber = Rc::clone(&viewport);
        store.subscribe(move |snapshot: &Arc<StageSnapshot>| -> Result<(), StageError> {
            subscriber.borrow_mut().sync(Arc::clone(snapshot))
        });
        Ok(Self {
            viewport,
            store,
            container: Rc::new(HeadlessElement::new(0.0, 0.0)),
            wrapper: Rc::new(HeadlessElement::new(0.0, 0.0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "layers": [{
            "id": "6f1c1f4e-3c55-4a8e-9a57-1f1b2d3c4e5f",
            "kind": "regional_guidance",
            "bbox": {"x": 0.0, "y": 0.0, "width": 512.0, "height": 512.0},
            "color": {"r": 255, "g": 0, "b": 0}
        }],
        "selected_layer_id": "6f1c1f4e-3c55-4a8e-9a57-1f1b2d3c4e5f",
        "tool": "brush",
        "brush_size": 4.0,
        "content_width": 512.0,
        "content_height": 512.0
    }"#;

    #[test]
    fn wasm_stage_new_is_unmounted() {
        let stage = WasmStage::new().expect("stage");
        assert!(!stage.is_mounted());
        assert!(stage.get_scene_json().is_empty());
    }

    #[test]
    fn with_config_rejects_invalid_json() {
        assert!(WasmStage::with_config("{ not valid json }").is_err());
    }

    #[test]
    fn pointer_stroke_round_trips_through_store() {
        let mut stage = WasmStage::new().expect("stage");
        stage.mount(512.0, 512.0).expect("mount");
        stage.set_snapshot_json(SNAPSHOT).expect("snapshot");

        assert_eq!(stage.pointer_event("down", 10.0, 10.0, 0).expect("down"), "[]");
        stage.pointer_event("move", 20.0, 10.0, 0).expect("move");
        let json = stage.pointer_event("up", 20.0, 10.0, 0).expect("up");
        assert!(json.contains("stroke_added"));

        let snapshot = StageSnapshot::from_json(&stage.get_snapshot_json()).expect("parse");
        assert_eq!(snapshot.layers[0].strokes.len(), 1);
        assert!(stage.get_scene_json().contains("stroke"));
    }

    #[test]
    fn pointer_event_rejects_unknown_kind() {
        let mut stage = WasmStage::new().expect("stage");
        assert!(stage.pointer_event("wiggle", 0.0, 0.0, 0).is_err());
    }
}
