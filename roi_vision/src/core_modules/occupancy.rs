// THEORY:
// The `occupancy` module is the behavioural layer of the system. It turns the
// per-frame "is the subject fully inside the ROI?" boolean into a narrative of
// discrete, timestamped events.
//
// Key architectural principles:
// 1.  **Two States**: The tracker is either `Outside` or `Inside`. While inside
//     it remembers the frame index at which the subject entered.
// 2.  **One Machine, Two Modes**: Answering "when did the subject first get in?"
//     and "every time it was in, for how long?" use the same transitions. The
//     `OccupancyMode` only decides what gets recorded, so the two answers can
//     never disagree about when an entry happened.
// 3.  **Append-Only History**: A completed interval is pushed once and never
//     rewritten. The only late addition is the flush at end of stream, which
//     closes an interval still open on the last processed frame.
// 4.  **Frame-Exact Timing**: Everything is kept in frame indices and converted
//     to seconds with the validated `FrameRate`, so a duration is exactly
//     `(exit_frame - entry_frame) / fps`.
// 5.  **Infallible**: Inputs are a boolean and a strictly increasing index;
//     there is nothing here that can fail.

use crate::core_modules::frame::FrameRate;
use serde::Deserialize;
use std::fmt;

/// What the run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyMode {
    /// Only the first time the subject is seen fully inside.
    FirstEntry,
    /// Every completed stay, with its duration.
    #[default]
    Intervals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyState {
    Outside,
    Inside { entry_frame: u64 },
}

/// A state change observed on a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered { frame: u64 },
    Exited { entry_frame: u64, exit_frame: u64 },
}

/// One completed stay inside the ROI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyEvent {
    pub entry_frame: u64,
    pub exit_frame: u64,
    /// Seconds from the start of the video.
    pub entry_time: f64,
    /// Seconds spent inside.
    pub duration: f64,
}

impl OccupancyEvent {
    fn new(entry_frame: u64, exit_frame: u64, rate: FrameRate) -> Self {
        Self {
            entry_frame,
            exit_frame,
            entry_time: rate.seconds(entry_frame),
            duration: rate.seconds(exit_frame - entry_frame),
        }
    }
}

/// The final answer of a run.
///
/// The two variants stay distinct: "never entered" is `None` in
/// first-entry mode and an empty list in interval mode.
#[derive(Debug, Clone, PartialEq)]
pub enum OccupancyReport {
    FirstEntry(Option<f64>),
    Intervals(Vec<OccupancyEvent>),
}

impl OccupancyReport {
    pub fn never_entered(&self) -> bool {
        match self {
            OccupancyReport::FirstEntry(time) => time.is_none(),
            OccupancyReport::Intervals(events) => events.is_empty(),
        }
    }
}

const NEVER_ENTERED: &str = "Subject never fully entered the ROI.";

impl fmt::Display for OccupancyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyReport::FirstEntry(Some(time)) => {
                write!(f, "Subject fully entered the ROI at {:.2} seconds.", time)
            }
            OccupancyReport::Intervals(events) if !events.is_empty() => {
                write!(f, "Subject entry times and durations:")?;
                for (i, event) in events.iter().enumerate() {
                    write!(
                        f,
                        "\n{}. Entered at {:.2}s, stayed for {:.2}s",
                        i + 1,
                        event.entry_time,
                        event.duration
                    )?;
                }
                Ok(())
            }
            _ => f.write_str(NEVER_ENTERED),
        }
    }
}

/// The occupancy state machine.
pub struct OccupancyTracker {
    mode: OccupancyMode,
    rate: FrameRate,
    state: OccupancyState,
    first_entry_frame: Option<u64>,
    events: Vec<OccupancyEvent>,
    last_frame: Option<u64>,
}

impl OccupancyTracker {
    pub fn new(mode: OccupancyMode, rate: FrameRate) -> Self {
        Self {
            mode,
            rate,
            state: OccupancyState::Outside,
            first_entry_frame: None,
            events: Vec::new(),
            last_frame: None,
        }
    }

    /// Feeds the containment result for `frame_index`.
    pub fn update(&mut self, frame_index: u64, contained: bool) -> Option<Transition> {
        debug_assert!(
            self.last_frame.is_none_or(|last| frame_index > last),
            "frame indices must be strictly increasing"
        );
        self.last_frame = Some(frame_index);

        match (self.state, contained) {
            (OccupancyState::Outside, true) => {
                self.state = OccupancyState::Inside { entry_frame: frame_index };
                if self.first_entry_frame.is_none() {
                    self.first_entry_frame = Some(frame_index);
                }
                Some(Transition::Entered { frame: frame_index })
            }
            (OccupancyState::Inside { entry_frame }, false) => {
                self.state = OccupancyState::Outside;
                self.record(entry_frame, frame_index);
                Some(Transition::Exited { entry_frame, exit_frame: frame_index })
            }
            _ => None,
        }
    }

    fn record(&mut self, entry_frame: u64, exit_frame: u64) {
        if self.mode == OccupancyMode::Intervals {
            self.events.push(OccupancyEvent::new(entry_frame, exit_frame, self.rate));
        }
    }

    pub fn state(&self) -> OccupancyState {
        self.state
    }

    pub fn mode(&self) -> OccupancyMode {
        self.mode
    }

    /// Seconds spent in the current stay as of `frame_index`, if inside.
    pub fn inside_for(&self, frame_index: u64) -> Option<f64> {
        match self.state {
            OccupancyState::Inside { entry_frame } => {
                Some(self.rate.seconds(frame_index.saturating_sub(entry_frame)))
            }
            OccupancyState::Outside => None,
        }
    }

    pub fn first_entry_time(&self) -> Option<f64> {
        self.first_entry_frame.map(|frame| self.rate.seconds(frame))
    }

    /// Completed intervals so far (always empty in first-entry mode).
    pub fn events(&self) -> &[OccupancyEvent] {
        &self.events
    }

    /// Closes the run. An interval still open is flushed at the last processed
    /// frame in interval mode.
    pub fn finish(mut self) -> OccupancyReport {
        match self.mode {
            OccupancyMode::FirstEntry => OccupancyReport::FirstEntry(self.first_entry_time()),
            OccupancyMode::Intervals => {
                if let (OccupancyState::Inside { entry_frame }, Some(last)) = (self.state, self.last_frame) {
                    log::debug!("flushing open interval {}..{} at end of stream", entry_frame, last);
                    self.record(entry_frame, last);
                }
                OccupancyReport::Intervals(self.events)
            }
        }
    }
}
