//! Codec lifecycle state machine.
//!
//! Reading is a probe followed by materialize calls in a fixed stage order;
//! writing is a header followed by appended sections in the same order. The
//! [`Session`] records where a codec is so that out-of-order calls fail
//! instead of silently reading from the wrong cursor position.

use std::fmt;

use crate::util::{Error, Result};

/// Lifecycle state of a codec instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoState {
    /// Nothing opened yet
    #[default]
    Unopened,
    /// Counts and tags are known, no payload read yet
    Probed,
    /// Payload sections are being read into caller buffers
    Materializing,
    /// Header written, sections being appended
    Writing,
    /// Handles released
    Closed,
}

impl fmt::Display for IoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unopened => "unopened",
            Self::Probed => "probed",
            Self::Materializing => "materializing",
            Self::Writing => "writing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Payload sections in the order they must be read or written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Points,
    Cells,
    PointData,
    CellData,
}

impl Stage {
    /// Human-readable operation name used in errors.
    pub const fn read_operation(self) -> &'static str {
        match self {
            Self::Points => "read points",
            Self::Cells => "read cells",
            Self::PointData => "read point data",
            Self::CellData => "read cell data",
        }
    }

    /// Human-readable operation name used in errors.
    pub const fn write_operation(self) -> &'static str {
        match self {
            Self::Points => "write points",
            Self::Cells => "write cells",
            Self::PointData => "write point data",
            Self::CellData => "write cell data",
        }
    }
}

/// Tracks the state of one codec instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    state: IoState,
    stage: Option<Stage>,
}

impl Session {
    /// Create a session in the `Unopened` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> IoState {
        self.state
    }

    /// Last stage that was started, if any.
    #[inline]
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Check that a probe may start. Only valid from `Unopened`.
    pub fn begin_probe(&self) -> Result<()> {
        match self.state {
            IoState::Unopened => Ok(()),
            state => Err(Error::InvalidState { operation: "probe mesh information", state }),
        }
    }

    /// Record a successful probe.
    pub fn finish_probe(&mut self) {
        self.state = IoState::Probed;
        self.stage = None;
    }

    /// Enter `stage` of the materialize pass.
    ///
    /// Valid from `Probed`, or from `Materializing` when `stage` is not
    /// earlier than the last one. Repeating a stage is allowed.
    pub fn begin_read(&mut self, stage: Stage) -> Result<()> {
        let operation = stage.read_operation();
        match self.state {
            IoState::Probed => {}
            IoState::Materializing if self.stage.map_or(true, |last| stage >= last) => {}
            state => return Err(Error::InvalidState { operation, state }),
        }
        self.state = IoState::Materializing;
        self.stage = Some(stage);
        Ok(())
    }

    /// Check that a header may be written. Valid from `Unopened` and
    /// `Writing` (which restarts the file).
    pub fn begin_header(&self) -> Result<()> {
        match self.state {
            IoState::Unopened | IoState::Writing => Ok(()),
            state => Err(Error::InvalidState { operation: "write mesh information", state }),
        }
    }

    /// Record a written header.
    pub fn finish_header(&mut self) {
        self.state = IoState::Writing;
        self.stage = None;
    }

    /// Enter `stage` of the write pass.
    pub fn begin_write(&mut self, stage: Stage) -> Result<()> {
        let operation = stage.write_operation();
        match self.state {
            IoState::Writing if self.stage.map_or(true, |last| stage > last) => {}
            state => return Err(Error::InvalidState { operation, state }),
        }
        self.stage = Some(stage);
        Ok(())
    }

    /// Mark the session closed.
    pub fn close(&mut self) {
        self.state = IoState::Closed;
        self.stage = None;
    }

    /// Return to `Unopened`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
