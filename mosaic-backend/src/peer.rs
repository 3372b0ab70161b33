//! # Native Peer Tracking
//!
//! A peer is one natively-rendered widget embedded in the otherwise
//! software-rendered component tree. The registry tracks live peers,
//! mediates attach/detach/reposition against the host container, and owns
//! the double-buffering handshake: the native side draws into a per-peer
//! buffer on the OS UI thread, the toolkit composites that buffer into
//! the main surface on its own thread, and a mutex keeps the two from
//! seeing half-written pixels.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    color::Color,
    host::{HostContainer, HostWidget},
    paint::PaintSurface,
    px::PxRect,
};

/// One natively-rendered widget embedded in the toolkit tree.
pub struct Peer {
    id: u64,
    bounds: PxRect,
    visible: bool,
    widget: Box<dyn HostWidget>,
    /// Native render buffer, shared with the OS UI thread. Sized to
    /// `bounds` lazily; see [`Peer::native_redraw`].
    buffer: Arc<Mutex<PaintSurface>>,
}

impl Peer {
    pub fn new(id: u64, widget: Box<dyn HostWidget>, bounds: PxRect) -> Self {
        Self {
            id,
            bounds,
            visible: true,
            widget,
            buffer: Arc::new(Mutex::new(PaintSurface::new())),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bounds(&self) -> PxRect {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.widget.set_visible(visible);
        }
    }

    /// Focusability as reported by the wrapped native widget.
    pub fn is_focusable(&self) -> bool {
        self.widget.is_focusable()
    }

    /// Proxies a focus request to the native widget. The correct native
    /// focus call differs between touch and key navigation mode.
    pub fn request_focus(&mut self, touch_mode: bool) {
        self.widget.request_focus(touch_mode);
    }

    /// Shared handle to the native render buffer, for callers that draw
    /// from the OS UI thread.
    pub fn buffer(&self) -> Arc<Mutex<PaintSurface>> {
        self.buffer.clone()
    }

    /// Lets the native widget redraw into the peer's buffer.
    ///
    /// The buffer is resized to the current bounds first when stale, then
    /// cleared to fully transparent so stale pixels from the previous
    /// frame never show through. Returns whether new content landed; a
    /// zero-area peer has nothing to composite.
    pub fn native_redraw(&mut self) -> bool {
        let size = self.bounds.size();
        if size.is_empty() {
            return false;
        }
        let mut buffer = self.buffer.lock();
        if buffer.size() != size {
            trace!(peer = self.id, "resizing peer buffer to {size:?}");
            buffer.acquire(size.width, size.height);
        }
        buffer.clear(Color::TRANSPARENT);
        let stride = buffer.stride();
        self.widget.draw(buffer.pixels_mut(), stride);
        true
    }

    /// Composites the peer's buffer into the main surface at the peer's
    /// position. Holds the buffer mutex for the duration of the copy.
    pub fn composite_into(&self, surface: &mut PaintSurface) {
        if !self.visible {
            return;
        }
        let buffer = self.buffer.lock();
        if buffer.size().is_empty() {
            return;
        }
        surface.draw_surface(&buffer, self.bounds.position());
    }
}

/// Tracks the set of live peers and mediates placement against the host
/// container.
pub struct NativePeerRegistry {
    container: Box<dyn HostContainer>,
    peers: Vec<Peer>,
    /// Set when a native redraw landed and the toolkit has not yet
    /// composited.
    repaint_needed: bool,
}

impl NativePeerRegistry {
    pub fn new(container: Box<dyn HostContainer>) -> Self {
        Self {
            container,
            peers: Vec::new(),
            repaint_needed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Attaches the peer's wrapper to the host container at its current
    /// bounds and starts tracking it.
    pub fn add(&mut self, mut peer: Peer) {
        self.container.attach(peer.id);
        let bounds = peer.bounds;
        peer.widget.set_frame(bounds);
        self.peers.push(peer);
    }

    /// Detaches and untracks. Dropping the peer releases its buffer.
    pub fn remove(&mut self, id: u64) -> Option<Peer> {
        let index = self.peers.iter().position(|p| p.id == id)?;
        self.container.detach(id);
        Some(self.peers.remove(index))
    }

    /// Updates a tracked peer's placement.
    ///
    /// A position-only change applies a relative offset to the existing
    /// native placement; a full relayout runs only when the size changed.
    /// Relayout is expensive and reposition fires on every scroll tick.
    pub fn reposition(&mut self, id: u64, bounds: PxRect) {
        let Some(peer) = self.peers.iter_mut().find(|p| p.id == id) else {
            return;
        };
        if peer.bounds == bounds {
            return;
        }
        if peer.bounds.size() == bounds.size() {
            let dx = (bounds.position().x - peer.bounds.position().x).raw();
            let dy = (bounds.position().y - peer.bounds.position().y).raw();
            peer.widget.offset_by(dx, dy);
        } else {
            peer.widget.set_frame(bounds);
        }
        peer.bounds = bounds;
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Peer> {
        self.peers.iter_mut().find(|p| p.id == id)
    }

    /// Runs the native redraw step for one peer and, when content landed,
    /// records that a toolkit-side composite is now required.
    pub fn native_redraw(&mut self, id: u64) {
        if let Some(peer) = self.peers.iter_mut().find(|p| p.id == id)
            && peer.native_redraw()
        {
            self.repaint_needed = true;
        }
    }

    /// Composites every visible peer's buffer into the main surface and
    /// clears the repaint flag.
    pub fn composite_all(&mut self, surface: &mut PaintSurface) {
        for peer in &self.peers {
            peer.composite_into(surface);
        }
        self.repaint_needed = false;
    }

    /// True when a native redraw happened since the last composite.
    pub fn repaint_needed(&self) -> bool {
        self.repaint_needed
    }

    pub fn in_touch_mode(&self) -> bool {
        self.container.in_touch_mode()
    }
}
