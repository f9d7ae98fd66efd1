//! Host panel glue
//!
//! The host toolkit owns the window and the event loop. It hands paint, resize and pointer
//! events to a [`DrawPanel`], which runs the frame bracket and blits the result back.

use copper_core::Point;
use tracing::debug;

use crate::compositor::PresentedImage;
use crate::context::{PathContext, RenderSurface};
use crate::error::Result;
use crate::gal::Gal;

/// Window services consumed from the host toolkit
pub trait HostWindow {
    /// Drawable size in pixels
    fn client_size(&self) -> (u32, u32);

    /// Ask the host to resize the window
    fn request_resize(&mut self, width: u32, height: u32);

    /// Ask the host to deliver a paint event
    fn request_repaint(&mut self);

    /// Show a finished frame
    fn blit(&mut self, image: &PresentedImage);
}

// ============================================================================
// Pointer Events
// ============================================================================

/// Pointer buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    /// Other button with index
    Other(u16),
}

/// Pointer events in window coordinates
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved to position
    Moved { x: f64, y: f64 },
    /// Button pressed at position
    ButtonPressed { button: PointerButton, x: f64, y: f64 },
    /// Button released at position
    ButtonReleased { button: PointerButton, x: f64, y: f64 },
    /// Wheel scrolled
    Scrolled { delta_x: f64, delta_y: f64 },
    /// Pointer entered the window
    Entered,
    /// Pointer left the window
    Left,
}

impl PointerEvent {
    /// Window position carried by the event, if any
    pub fn position(&self) -> Option<Point> {
        match *self {
            PointerEvent::Moved { x, y }
            | PointerEvent::ButtonPressed { x, y, .. }
            | PointerEvent::ButtonReleased { x, y, .. } => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Receiver of pointer events forwarded by a panel
pub trait PointerListener {
    fn on_pointer(&mut self, event: &PointerEvent);
}

impl<F: FnMut(&PointerEvent)> PointerListener for F {
    fn on_pointer(&mut self, event: &PointerEvent) {
        self(event)
    }
}

// ============================================================================
// Draw Panel
// ============================================================================

/// Drawing area embedded in a host window
pub struct DrawPanel<C, H> {
    gal: Gal<C>,
    host: H,
    listener: Option<Box<dyn PointerListener>>,
    refresh_pending: bool,
}

impl<C: PathContext + RenderSurface, H: HostWindow> DrawPanel<C, H> {
    /// Wrap a renderer, sizing its screen to the host window
    pub fn new(mut gal: Gal<C>, host: H) -> Result<Self> {
        let (width, height) = host.client_size();
        gal.resize_screen(width, height)?;

        Ok(Self {
            gal,
            host,
            listener: None,
            refresh_pending: false,
        })
    }

    pub fn gal(&self) -> &Gal<C> {
        &self.gal
    }

    pub fn gal_mut(&mut self) -> &mut Gal<C> {
        &mut self.gal
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn set_listener(&mut self, listener: impl PointerListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// A repaint has been requested and not yet delivered
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// Request a repaint; requests coalesce until the next paint
    pub fn refresh(&mut self) {
        if self.refresh_pending {
            return;
        }
        self.refresh_pending = true;
        self.host.request_repaint();
    }

    pub fn request_resize(&mut self, width: u32, height: u32) {
        self.host.request_resize(width, height);
    }

    /// Run one frame: clear, let `redraw` draw, present and blit to the host
    pub fn deliver_paint(&mut self, redraw: impl FnOnce(&mut Gal<C>)) {
        let background = self.gal.options().background;

        let mut frame = self.gal.begin_drawing();
        frame.clear_screen(background);
        redraw(&mut *frame);
        let image = frame.end();

        self.host.blit(&image);
        self.refresh_pending = false;
    }

    /// Resize the screen to a new client size and schedule a repaint
    pub fn deliver_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.gal.resize_screen(width, height)?;
        debug!("Panel resized to {}x{}", width, height);
        self.refresh();
        Ok(())
    }

    /// Track the cursor, forward the event to the listener and schedule a repaint
    pub fn deliver_pointer(&mut self, event: PointerEvent) {
        if let Some(position) = event.position() {
            let world = self.gal.to_world(position);
            self.gal.draw_cursor(world);
        }

        if let Some(listener) = self.listener.as_mut() {
            listener.on_pointer(&event);
        }

        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{ContextCall, RecordingContext};
    use crate::view::{GalOptions, ViewOptions};
    use copper_core::Color;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeHost {
        size: (u32, u32),
        repaints: usize,
        resizes: Vec<(u32, u32)>,
        blits: Vec<(u32, u32)>,
    }

    impl HostWindow for FakeHost {
        fn client_size(&self) -> (u32, u32) {
            self.size
        }

        fn request_resize(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }

        fn request_repaint(&mut self) {
            self.repaints += 1;
        }

        fn blit(&mut self, image: &PresentedImage) {
            self.blits.push((image.width(), image.height()));
        }
    }

    fn panel() -> DrawPanel<RecordingContext, FakeHost> {
        let gal = Gal::new(
            RecordingContext::new(1, 1),
            GalOptions {
                background: Color::BLUE,
                ..GalOptions::default()
            },
            ViewOptions::default(),
        );
        let host = FakeHost {
            size: (64, 48),
            ..FakeHost::default()
        };
        DrawPanel::new(gal, host).unwrap()
    }

    #[test]
    fn test_new_panel_takes_host_size() {
        let panel = panel();
        assert_eq!(panel.gal().screen_size(), (64, 48));
    }

    #[test]
    fn test_paint_runs_frame_and_blits() {
        let mut panel = panel();
        panel.refresh();
        panel.deliver_paint(|gal| gal.draw_line(Point::ZERO, Point::new(1.0, 0.0)));

        assert_eq!(panel.host().blits, vec![(64, 48)]);
        assert!(!panel.refresh_pending());

        let calls = panel.gal().context().calls();
        let paint = calls.iter().position(|c| *c == ContextCall::Paint(Color::BLUE));
        let line = calls
            .iter()
            .position(|c| *c == ContextCall::LineTo(Point::new(1.0, 0.0)));
        let present = calls.iter().position(|c| *c == ContextCall::Present(Color::BLUE));
        assert!(paint.is_some());
        assert!(paint < line && line < present);
    }

    #[test]
    fn test_refresh_requests_coalesce() {
        let mut panel = panel();
        panel.deliver_pointer(PointerEvent::Entered);
        panel.deliver_pointer(PointerEvent::Moved { x: 3.0, y: 4.0 });
        assert_eq!(panel.host().repaints, 1);

        panel.deliver_paint(|_| {});
        panel.deliver_resize(32, 32).unwrap();
        assert_eq!(panel.host().repaints, 2);
        assert_eq!(panel.gal().screen_size(), (32, 32));
    }

    #[test]
    fn test_pointer_events_reach_listener() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut panel = panel();
        panel.set_listener(move |event: &PointerEvent| sink.borrow_mut().push(event.clone()));
        panel.deliver_pointer(PointerEvent::ButtonPressed {
            button: PointerButton::Left,
            x: 1.0,
            y: 2.0,
        });
        panel.clear_listener();
        panel.deliver_pointer(PointerEvent::Left);

        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_request_resize_goes_to_host() {
        let mut panel = panel();
        panel.request_resize(10, 20);
        assert_eq!(panel.host().resizes, vec![(10, 20)]);
    }
}
