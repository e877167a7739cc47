// core/state.rs

// Navigation session state machine. The mode decides whether a bumper press may
// interrupt motion: while a recovery maneuver is running its own sub-moves, the
// robot is expected to touch the obstacle and must not re-enter recovery.

use log::{debug, warn};

/// Session modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,               // No navigation in progress
    Navigating,         // Driving towards a waypoint
    RecoveringFromBump, // Running a bump recovery maneuver
    AutoPiloting,       // Laser autopilot driving standalone
    ChasingBeacon,      // Camera-guided approach to a coloured beacon
}

/// Mode tracking for one robot. Owned by the `Robot` wrapper.
#[derive(Debug)]
pub struct NavigationSession {
    mode: Mode,
    // Mode to go back to once the current recovery finishes
    resume_mode: Mode,
    recoveries: u32,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationSession {
    pub fn new() -> Self {
        NavigationSession {
            mode: Mode::Idle,
            resume_mode: Mode::Idle,
            recoveries: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True exactly while a recovery maneuver's own moves are executing.
    pub fn is_handling_bump(&self) -> bool {
        self.mode == Mode::RecoveringFromBump
    }

    /// Number of recovery maneuvers started in this session
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn start_navigating(&mut self) {
        if self.is_handling_bump() {
            warn!("start_navigating called during bump recovery; ignored");
            return;
        }
        self.transition(Mode::Navigating);
    }

    pub fn start_autopilot(&mut self) {
        if self.is_handling_bump() {
            // Recovery-driven autopilot stays in recovery mode
            return;
        }
        self.transition(Mode::AutoPiloting);
    }

    pub fn start_chasing_beacon(&mut self) {
        if self.is_handling_bump() {
            warn!("start_chasing_beacon called during bump recovery; ignored");
            return;
        }
        self.transition(Mode::ChasingBeacon);
    }

    pub fn stop(&mut self) {
        if self.is_handling_bump() {
            return;
        }
        self.transition(Mode::Idle);
    }

    /// Enters recovery. Returns false if a recovery is already active.
    pub fn enter_recovery(&mut self) -> bool {
        if self.is_handling_bump() {
            warn!("Bump recovery already in progress; refusing to nest");
            return false;
        }
        self.resume_mode = self.mode;
        self.recoveries += 1;
        self.transition(Mode::RecoveringFromBump);
        true
    }

    pub fn exit_recovery(&mut self) {
        if !self.is_handling_bump() {
            return;
        }
        let resume = self.resume_mode;
        self.transition(resume);
    }

    fn transition(&mut self, next: Mode) {
        if self.mode != next {
            debug!("Session mode {:?} -> {:?}", self.mode, next);
            self.mode = next;
        }
    }
}
