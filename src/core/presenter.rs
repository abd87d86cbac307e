//=========================================================================
// Presenter
//=========================================================================
//
// Single-owner actor around a PresentationBridge.
//
// Architecture:
//   PresenterHandle (any context) → latest-frame slot + Sender<SurfaceCommand>
//     → Presenter::pump() (owning context) → PresentationBridge
//
// Only the owning context ever touches the surface. Frames are shape
// checked on the sending side so a malformed buffer fails at the caller.
// A new frame replaces any frame still waiting in the slot, so at most one
// frame copy is queued and the owner always presents the newest one.
//
//=========================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crossbeam_channel::{unbounded, Receiver, RecvError, Sender, TryRecvError};
use log::{debug, warn};

use super::bridge::PresentationBridge;
use super::surface::{DisplaySurface, SurfaceSize};
use crate::error::{BridgeError, Result};
use crate::frame::Frame;

/// Queue depth past which `pump` reports a backlog
const BACKLOG_WARN_THRESHOLD: usize = 64;

/// Message sent to the presenter's owning context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCommand {
    /// The frame slot went from empty to full
    FrameReady,
    Resize(SurfaceSize),
    Shutdown,
}

/// Outcome of draining the command queue once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// Nothing was written to the surface
    Idle,
    /// A frame reached the surface
    Presented,
    /// Shutdown requested or every handle dropped
    Closed,
}

//=== Frame slot ==========================================================

struct FrameSlot {
    frame: Mutex<Option<Frame>>,
    next_number: AtomicU64,
    replaced: AtomicU64,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            frame: Mutex::new(None),
            next_number: AtomicU64::new(0),
            replaced: AtomicU64::new(0),
        }
    }

    /// Store `frame`, returning true when the slot was empty before
    fn put(&self, frame: Frame) -> bool {
        let previous = self
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame);
        match previous {
            Some(_) => {
                self.replaced.fetch_add(1, Ordering::Relaxed);
                false
            }
            None => true,
        }
    }

    fn take(&self) -> Option<Frame> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

//=== PresenterHandle =====================================================

/// Cloneable sending side; safe to use from any thread
#[derive(Clone)]
pub struct PresenterHandle {
    sender: Sender<SurfaceCommand>,
    slot: Weak<FrameSlot>,
}

impl PresenterHandle {
    /// Queue a frame. The shape is checked here, before anything is sent.
    ///
    /// Frames are numbered in submission order across all clones of the handle.
    pub fn present(&self, buffer: &[u8], width: u32) -> Result<()> {
        let slot = self.slot()?;
        let number = slot.next_number.fetch_add(1, Ordering::Relaxed);
        self.put(&slot, Frame::copy_from(number, buffer, width)?)
    }

    /// Queue an owned frame without copying it
    pub fn submit(&self, frame: Frame) -> Result<()> {
        let slot = self.slot()?;
        self.put(&slot, frame)
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.send(SurfaceCommand::Resize(SurfaceSize::new(width, height)))
    }

    /// Ask the presenter to stop; later commands are dropped
    pub fn close(&self) -> Result<()> {
        self.send(SurfaceCommand::Shutdown)
    }

    fn put(&self, slot: &FrameSlot, frame: Frame) -> Result<()> {
        if slot.put(frame) {
            self.send(SurfaceCommand::FrameReady)?;
        }
        Ok(())
    }

    fn slot(&self) -> Result<Arc<FrameSlot>> {
        self.slot.upgrade().ok_or_else(shut_down)
    }

    fn send(&self, command: SurfaceCommand) -> Result<()> {
        self.sender.send(command).map_err(|_| shut_down())
    }
}

fn shut_down() -> BridgeError {
    BridgeError::surface_unavailable("presenter has shut down")
}

//=== Presenter ===========================================================

/// Owning side of the actor; lives on the context that owns the surface
pub struct Presenter<S: DisplaySurface> {
    bridge: PresentationBridge<S>,
    receiver: Receiver<SurfaceCommand>,
    slot: Arc<FrameSlot>,
    closed: bool,
    frames_presented: u64,
    last_presented: Option<u64>,
}

impl<S: DisplaySurface> Presenter<S> {
    pub fn new(bridge: PresentationBridge<S>) -> (Self, PresenterHandle) {
        let (sender, receiver) = unbounded();
        let slot = Arc::new(FrameSlot::new());
        let handle = PresenterHandle {
            sender,
            slot: Arc::downgrade(&slot),
        };
        let presenter = Self {
            bridge,
            receiver,
            slot,
            closed: false,
            frames_presented: 0,
            last_presented: None,
        };
        (presenter, handle)
    }

    /// Drain what is queued right now without blocking.
    ///
    /// Resizes are applied in order, then the newest waiting frame is
    /// written, so the surface never trails the producer by more than the
    /// frame submitted during this call.
    pub fn pump(&mut self) -> PumpStatus {
        if self.closed {
            return PumpStatus::Closed;
        }

        let backlog = self.receiver.len();
        if backlog > BACKLOG_WARN_THRESHOLD {
            warn!("Presenter backlog: {} commands queued", backlog);
        }

        // One extra receive notices a disconnect on an empty queue
        for _ in 0..=backlog {
            match self.receiver.try_recv() {
                Ok(SurfaceCommand::FrameReady) => {}
                Ok(SurfaceCommand::Resize(size)) => self.bridge.resize(size.width, size.height),
                Ok(SurfaceCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        let presented = self.flush();
        if self.closed {
            debug!("Presenter closed after {} frames", self.frames_presented);
            PumpStatus::Closed
        } else if presented {
            PumpStatus::Presented
        } else {
            PumpStatus::Idle
        }
    }

    /// Block, applying commands in order until shutdown or disconnect
    pub fn run(mut self) -> PresentationBridge<S> {
        while !self.closed {
            match self.receiver.recv() {
                Ok(SurfaceCommand::FrameReady) => {
                    self.flush();
                }
                Ok(SurfaceCommand::Resize(size)) => self.bridge.resize(size.width, size.height),
                Ok(SurfaceCommand::Shutdown) | Err(RecvError) => {
                    self.flush();
                    self.closed = true;
                }
            }
        }
        debug!(
            "Presenter stopped after {} frames ({} coalesced)",
            self.frames_presented,
            self.frames_coalesced()
        );
        self.bridge
    }

    pub fn bridge(&self) -> &PresentationBridge<S> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut PresentationBridge<S> {
        &mut self.bridge
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Frames replaced in the slot before the owner got to them
    pub fn frames_coalesced(&self) -> u64 {
        self.slot.replaced.load(Ordering::Relaxed)
    }

    /// Number of the frame most recently written to the surface
    pub fn last_presented(&self) -> Option<u64> {
        self.last_presented
    }

    fn flush(&mut self) -> bool {
        let Some(frame) = self.slot.take() else {
            return false;
        };
        match self.bridge.present(frame.pixels(), frame.width()) {
            Ok(()) => {
                self.frames_presented += 1;
                self.last_presented = Some(frame.number);
                true
            }
            Err(e) => {
                warn!("Dropped frame {}: {}", frame.number, e);
                false
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
