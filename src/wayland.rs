// Wayland integration module
// Handles all Wayland-specific functionality using smithay-client-toolkit

use crate::app::AppState;
use crate::cli::MAX_WINDOW_SIZE;
use crate::input::{Button, InputEvent, Key, KeyRepeat, WheelDirection};
use crate::render::{self, Framebuffer};
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::time::Instant;
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer,
    delegate_registry, delegate_seat, delegate_shm, delegate_xdg_shell, delegate_xdg_window,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        xdg::{
            window::{Window, WindowConfigure, WindowDecorations, WindowHandler},
            XdgShell,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

/// Mouse button constants
const BTN_LEFT: u32 = 272;

/// Application id announced to the compositor
const APP_ID: &str = "pixview";

/// Main Wayland application state
struct WaylandApp {
    // Registry state
    registry_state: RegistryState,
    // Seat state for input handling
    seat_state: SeatState,
    // Output state for display info
    output_state: OutputState,
    // Shared memory for buffer allocation
    shm: Shm,

    // Viewer state driven by translated input
    state: AppState,
    // Input translated during the current dispatch, handled before the next frame
    pending: Vec<InputEvent>,
    // Held pan/zoom key, re-sent while the key stays down
    key_repeat: KeyRepeat,

    // Surface and buffer management
    window: Window,
    pool: SlotPool,
    // Keeps the last attached buffer alive until the compositor releases it
    _buffer: Option<Buffer>,
    width: u32,
    height: u32,
    configured: bool,
    // Set after a commit until the compositor's frame callback arrives
    frame_pending: bool,
}

impl WaylandApp {
    /// Hand every collected input event to the viewer, in arrival order
    fn process_pending(&mut self) {
        for event in self.pending.drain(..) {
            self.state.handle_event(event);
        }
    }

    /// Render one frame into a fresh shm buffer and present it
    fn draw(&mut self, qh: &QueueHandle<Self>) {
        let width = self.width;
        let height = self.height;

        // Calculate buffer size (4 bytes per pixel for XRGB)
        let stride = width as i32 * 4;
        let buffer_size = stride as usize * height as usize;

        if self.pool.len() < buffer_size {
            if let Err(e) = self.pool.resize(buffer_size) {
                error!("Failed to resize pool to {} bytes: {}", buffer_size, e);
                return;
            }
        }

        let (buffer, canvas) = match self.pool.create_buffer(
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Xrgb8888,
        ) {
            Ok(buf) => buf,
            Err(e) => {
                error!("Failed to create buffer {}x{}: {}", width, height, e);
                return;
            }
        };

        match Framebuffer::new(canvas, width, height) {
            Some(mut framebuffer) => {
                render::render_frame(&mut framebuffer, &self.state.image, &self.state.view)
            }
            None => {
                error!("Shared memory canvas does not match {}x{}", width, height);
                return;
            }
        }

        // Attach, request the next frame callback, and commit
        let surface = self.window.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            error!("Failed to attach buffer: {}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.frame(qh, surface.clone());
        self.window.commit();

        self._buffer = Some(buffer);
        self.frame_pending = true;
    }
}

/// Translate a keysym into a viewer key
fn map_key(keysym: Keysym) -> Option<Key> {
    match keysym {
        Keysym::Escape => Some(Key::Escape),
        Keysym::Left | Keysym::KP_Left => Some(Key::Left),
        Keysym::Right | Keysym::KP_Right => Some(Key::Right),
        Keysym::Up | Keysym::KP_Up => Some(Key::Up),
        Keysym::Down | Keysym::KP_Down => Some(Key::Down),
        Keysym::plus | Keysym::equal | Keysym::KP_Add => Some(Key::Plus),
        Keysym::minus | Keysym::KP_Subtract => Some(Key::Minus),
        Keysym::Home | Keysym::_0 => Some(Key::Reset),
        _ => None,
    }
}

fn map_button(button: u32) -> Button {
    if button == BTN_LEFT {
        Button::Primary
    } else {
        Button::Other(button)
    }
}

/// One wheel step from a vertical axis value; positive scrolls down
fn wheel_direction(absolute: f64) -> Option<WheelDirection> {
    if absolute > 0.0 {
        Some(WheelDirection::Down)
    } else if absolute < 0.0 {
        Some(WheelDirection::Up)
    } else {
        None
    }
}

// Implement required traits for smithay-client-toolkit

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
        debug!("Scale factor changed");
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
        debug!("Transform changed");
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.frame_pending = false;
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("New output detected");
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output updated");
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output destroyed");
    }
}

impl WindowHandler for WaylandApp {
    fn request_close(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _window: &Window) {
        self.pending.push(InputEvent::Quit);
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _window: &Window,
        configure: WindowConfigure,
        _serial: u32,
    ) {
        debug!("Window configured: {:?}", configure.new_size);

        // A missing dimension leaves the choice to us: keep the current one
        let width = configure.new_size.0.map_or(self.width, |w| w.get().min(MAX_WINDOW_SIZE));
        let height = configure.new_size.1.map_or(self.height, |h| h.get().min(MAX_WINDOW_SIZE));

        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.pending.push(InputEvent::Resized { width, height });
        }

        if !self.configured {
            info!("Window mapped at {}x{}", width, height);
            self.configured = true;
        }
    }
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("New seat");
    }

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        debug!("New capability: {:?}", capability);

        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                error!("Failed to get keyboard: {}", e);
            }
        }
        if capability == Capability::Pointer {
            if let Err(e) = self.seat_state.get_pointer(qh, &seat) {
                error!("Failed to get pointer: {}", e);
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        _capability: Capability,
    ) {
        debug!("Capability removed");
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("Seat removed");
    }
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
        _raw: &[u32],
        _keysyms: &[Keysym],
    ) {
        debug!("Keyboard entered surface");
    }

    fn leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
    ) {
        debug!("Keyboard left surface");
        self.key_repeat.cancel();
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        debug!("Key pressed: {:?}", event.keysym);

        if let Some(key) = map_key(event.keysym) {
            self.key_repeat.press(event.raw_code, key, Instant::now());
            self.pending.push(InputEvent::KeyPressed(key));
        }
    }

    fn release_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        self.key_repeat.release(event.raw_code);
    }

    fn update_modifiers(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _modifiers: Modifiers,
        _layout: u32,
    ) {
    }
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            let (x, y) = event.position;
            match event.kind {
                PointerEventKind::Enter { .. } => {
                    debug!("Pointer entered");
                    self.pending.push(InputEvent::PointerMotion { x, y });
                }
                PointerEventKind::Leave { .. } => {
                    debug!("Pointer left");
                    self.pending.push(InputEvent::PointerLeave);
                }
                PointerEventKind::Motion { .. } => {
                    self.pending.push(InputEvent::PointerMotion { x, y });
                }
                PointerEventKind::Press { button, .. } => {
                    debug!("Pointer button pressed: {}", button);
                    self.pending.push(InputEvent::PointerDown {
                        button: map_button(button),
                        x,
                        y,
                    });
                }
                PointerEventKind::Release { button, .. } => {
                    self.pending.push(InputEvent::PointerUp {
                        button: map_button(button),
                    });
                }
                PointerEventKind::Axis { vertical, .. } => {
                    if let Some(direction) = wheel_direction(vertical.absolute) {
                        self.pending.push(InputEvent::Wheel(direction));
                    }
                }
            }
        }
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

// Delegate macros
delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_xdg_shell!(WaylandApp);
delegate_xdg_window!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_registry!(WaylandApp);

/// Open a window for `state` and run the viewer until it is told to quit
pub fn run(state: AppState, title: &str) -> Result<()> {
    info!("Connecting to Wayland display");

    // Connect to Wayland display
    let conn = Connection::connect_to_env().context("Failed to connect to Wayland display")?;

    // Initialize registry and event queue
    let (globals, mut event_queue) =
        registry_queue_init(&conn).context("Failed to initialize registry")?;
    let qh = event_queue.handle();

    // Initialize required globals
    let compositor_state =
        CompositorState::bind(&globals, &qh).context("Failed to bind compositor")?;
    let xdg_shell = XdgShell::bind(&globals, &qh).context("Failed to bind xdg shell")?;
    let shm = Shm::bind(&globals, &qh).context("Failed to bind shm")?;

    let (width, height) = state.viewport;
    let pool = SlotPool::new(width as usize * height as usize * 4, &shm)
        .context("Failed to create shm pool")?;

    // Create the toplevel window; the first configure sets `configured`
    let surface = compositor_state.create_surface(&qh);
    let window = xdg_shell.create_window(surface, WindowDecorations::RequestServer, &qh);
    window.set_title(title);
    window.set_app_id(APP_ID);
    window.set_min_size(Some((1, 1)));
    window.set_max_size(Some((MAX_WINDOW_SIZE, MAX_WINDOW_SIZE)));
    window.commit();

    let mut app = WaylandApp {
        registry_state: RegistryState::new(&globals),
        seat_state: SeatState::new(&globals, &qh),
        output_state: OutputState::new(&globals, &qh),
        shm,
        state,
        pending: Vec::new(),
        key_repeat: KeyRepeat::new(),
        window,
        pool,
        _buffer: None,
        width,
        height,
        configured: false,
        frame_pending: false,
    };

    info!("Starting event loop");
    info!("Controls: Arrows or drag to pan, +/- or scroll to zoom, Home to reset, Esc to quit");

    // Main event loop: drain input, then draw once the compositor is ready
    while app.state.is_running() {
        event_queue.blocking_dispatch(&mut app)?;
        // Frame callbacks keep waking the loop, so a held key is polled every frame
        if let Some(key) = app.key_repeat.poll(Instant::now()) {
            app.pending.push(InputEvent::KeyPressed(key));
        }
        app.process_pending();

        if app.state.is_running() && app.configured && !app.frame_pending {
            app.draw(&qh);
        }
    }

    info!("Exiting application");
    Ok(())
}
