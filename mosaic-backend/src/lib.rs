//! mosaic-backend is the platform-binding layer of the mosaic UI toolkit.
//!
//! The toolkit renders its component tree into a software framebuffer and
//! only a handful of things are truly native: embedded native widgets
//! (peers), the invisible edit view that fronts the OS input method, and
//! the presentable surface the framebuffer is copied to. This crate owns
//! the machinery that keeps those natives in lock-step with the toolkit:
//!
//! - [`paint::PaintSurface`] and [`presenter::FrameBufferPresenter`] for
//!   the software framebuffer and its screen copies;
//! - [`input_router::InputRouter`] and [`keymap`] for normalizing host
//!   key/pointer input into toolkit events;
//! - [`peer::NativePeerRegistry`] for embedded native widgets and their
//!   shared render buffers;
//! - [`edit_proxy::EditBridge`] for input-method sessions against a
//!   hidden native edit view;
//! - [`synchronizer::PeerSynchronizer`] for surface lifecycle and resize
//!   propagation;
//! - [`context::BindingContext`] to wire it all together per host window.
//!
//! Threading is the binding's central concern: the toolkit runs its own
//! single-threaded event/paint loop ([`dispatch::ToolkitThread`]) while
//! the OS UI thread delivers native callbacks. See [`dispatch`] for the
//! two marshaling primitives everything else is built on.

pub mod android;
pub mod color;
pub mod context;
pub mod dispatch;
pub mod edit_proxy;
pub mod error;
pub mod form;
pub mod frame;
pub mod host;
pub mod input_router;
pub mod keymap;
pub mod paint;
pub mod peer;
pub mod presenter;
pub mod px;
pub mod synchronizer;
mod thread_utils;

pub use winit;

pub use crate::{
    color::Color,
    context::{BindingContext, BindingContextBuilder},
    dispatch::{Task, ToolkitHandle, ToolkitThread, UiDispatcher, post_and_wait},
    edit_proxy::{EditBridge, EditorAction, SessionState},
    error::{BindingError, PresentError},
    form::{EditableText, FieldHandle, FormHandle, FormModel, TextConstraint},
    frame::FramePoller,
    host::{
        HostContainer, HostDialogs, HostEditTarget, HostServices, HostSurfaceFocus, HostWidget,
    },
    input_router::{InputRouter, RouterAction},
    keymap::{HostKey, KeyState, RawKeyEvent, key_code},
    paint::PaintSurface,
    peer::{NativePeerRegistry, Peer},
    presenter::{DirtyRegion, FrameBufferPresenter, PresentTarget},
    px::{Px, PxPosition, PxRect, PxSize},
    synchronizer::{FormNotice, PeerSynchronizer},
};
