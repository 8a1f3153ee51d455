// Application state module
// Owns the image and view, and dispatches input events against them

use crate::image_loader::ImageData;
use crate::input::{Button, InputEvent, Key, WheelDirection};
use crate::view::ViewTransform;
use log::{debug, info};

/// Screen units moved per arrow key press
pub const PAN_STEP: f64 = 20.0;

/// Scale multiplier per zoom step
pub const ZOOM_STEP: f64 = 1.1;

/// Drag-tracking state for the primary pointer button
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionState {
    pub dragging: bool,
    pub drag_start_pos: (f64, f64),
    pub drag_start_offset: (f64, f64),
    /// Last known pointer position in surface coordinates
    pub pointer_pos: (f64, f64),
}

/// Main application state
pub struct AppState {
    /// The loaded image data
    pub image: ImageData,
    /// Current view of the image
    pub view: ViewTransform,
    pub interaction: InteractionState,
    /// Window content size
    pub viewport: (u32, u32),
    /// View restored by the reset key
    initial_view: ViewTransform,
    running: bool,
}

impl AppState {
    /// Create a new application state with the image centred in the viewport
    pub fn new(image: ImageData, viewport: (u32, u32), scale: f64) -> Self {
        let view = ViewTransform::centered((image.width, image.height), viewport, scale);
        Self {
            image,
            view,
            interaction: InteractionState::default(),
            viewport,
            initial_view: view,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mark the application for exit
    pub fn exit(&mut self) {
        self.running = false;
    }

    fn viewport_center(&self) -> (f64, f64) {
        (self.viewport.0 as f64 / 2.0, self.viewport.1 as f64 / 2.0)
    }

    fn zoom(&mut self, direction: WheelDirection, anchor: (f64, f64)) {
        let factor = match direction {
            WheelDirection::Up => ZOOM_STEP,
            WheelDirection::Down => 1.0 / ZOOM_STEP,
        };
        if self.view.zoom_around_anchor(factor, anchor.0, anchor.1) {
            // Restart an active drag from the zoomed view, or the next motion
            // would restore the pre-zoom offset
            if self.interaction.dragging {
                self.interaction.drag_start_pos = self.interaction.pointer_pos;
                self.interaction.drag_start_offset = (self.view.offset_x, self.view.offset_y);
            }

            let (image_x, image_y) = self.view.screen_to_image(anchor.0, anchor.1);
            debug!(
                "Zoom {:.4} anchored at image ({:.1}, {:.1})",
                self.view.scale, image_x, image_y
            );
        }
    }

    fn handle_key(&mut self, key: Key) {
        match key {
            Key::Escape => {
                info!("Exit key pressed");
                self.exit();
            }
            // Arrow keys move the image toward the arrow's opposite side
            Key::Left => self.view.pan(PAN_STEP, 0.0),
            Key::Right => self.view.pan(-PAN_STEP, 0.0),
            Key::Up => self.view.pan(0.0, PAN_STEP),
            Key::Down => self.view.pan(0.0, -PAN_STEP),
            Key::Plus => self.zoom(WheelDirection::Up, self.viewport_center()),
            Key::Minus => self.zoom(WheelDirection::Down, self.viewport_center()),
            Key::Reset => {
                self.view = self.initial_view;
                self.interaction.dragging = false;
            }
        }
    }

    /// Apply one input event to the state
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => {
                info!("Close requested");
                self.exit();
            }
            InputEvent::KeyPressed(key) => self.handle_key(key),
            InputEvent::Wheel(direction) => self.zoom(direction, self.interaction.pointer_pos),
            InputEvent::PointerDown {
                button: Button::Primary,
                x,
                y,
            } => {
                self.interaction.pointer_pos = (x, y);
                self.interaction.dragging = true;
                self.interaction.drag_start_pos = (x, y);
                self.interaction.drag_start_offset = (self.view.offset_x, self.view.offset_y);
            }
            InputEvent::PointerUp {
                button: Button::Primary,
            }
            | InputEvent::PointerLeave => {
                self.interaction.dragging = false;
            }
            InputEvent::PointerDown {
                button: Button::Other(code),
                ..
            } => {
                debug!("Ignoring pointer button {}", code);
            }
            InputEvent::PointerUp { .. } => {}
            InputEvent::PointerMotion { x, y } => {
                self.interaction.pointer_pos = (x, y);

                // Recompute from the drag snapshot so motion never accumulates drift
                if self.interaction.dragging {
                    let (start_x, start_y) = self.interaction.drag_start_pos;
                    let (offset_x, offset_y) = self.interaction.drag_start_offset;
                    self.view.offset_x = offset_x + (x - start_x);
                    self.view.offset_y = offset_y + (y - start_y);
                }
            }
            InputEvent::Resized { width, height } => {
                debug!("Viewport resized to {}x{}", width, height);
                self.viewport = (width, height);
            }
        }
    }
}
