// Display state computation.
//
// Pure: the same (now, schedule, videos) always produce the same snapshot.
// The caller re-resolves today's schedule before every call, so there is no
// day-rollover bookkeeping here.

use time::macros::format_description;
use time::{Duration, PrimitiveDateTime};
use tracing::warn;

use crate::model::{DisplayState, DisplayStateSnapshot, ScheduleRecord, Video};
use crate::schedule::ScheduleWindow;

/// Default length of the celebratory window after maghrib.
pub const DEFAULT_BERBUKA_WINDOW: Duration = Duration::seconds(300);

#[derive(Debug, Clone, Copy)]
pub struct StateComputer {
    berbuka_window: Duration,
}

impl Default for StateComputer {
    fn default() -> Self {
        Self::new(DEFAULT_BERBUKA_WINDOW)
    }
}

impl StateComputer {
    pub fn new(berbuka_window: Duration) -> Self {
        Self { berbuka_window }
    }

    pub fn berbuka_window(&self) -> Duration {
        self.berbuka_window
    }

    /// Derive the snapshot for `now` (local civil time).
    ///
    /// Rules, first match wins:
    /// 1. no usable schedule: TVC
    /// 2. before subuh: TVC
    /// 3. subuh up to maghrib: COUNTDOWN
    /// 4. maghrib up to maghrib + window: BERBUKA
    /// 5. otherwise: TVC
    pub fn compute(
        &self,
        now: PrimitiveDateTime,
        schedule: Option<&ScheduleRecord>,
        tvc_videos: &[Video],
        berbuka_video: Option<&Video>,
    ) -> DisplayStateSnapshot {
        let tvc_videos = tvc_videos.to_vec();

        let (record, window) = match schedule {
            None => return unscheduled(tvc_videos),
            Some(record) => match ScheduleWindow::from_record(record) {
                Ok(window) => (record, window),
                Err(e) => {
                    // Keep the screen up; the operator sees this in the logs.
                    warn!(date = %record.date, error = %e, "ignoring unusable schedule");
                    return unscheduled(tvc_videos);
                }
            },
        };

        let day = now.date();
        let subuh_at = day.with_time(window.subuh);
        let maghrib_at = day.with_time(window.maghrib);
        let berbuka_end = maghrib_at.saturating_add(self.berbuka_window);

        let mut snapshot = DisplayStateSnapshot {
            state: DisplayState::Tvc,
            countdown_seconds: None,
            subuh_time: Some(record.subuh_time.clone()),
            maghrib_time: Some(record.maghrib_time.clone()),
            location: Some(record.location.clone()),
            current_tvc_videos: tvc_videos,
            berbuka_video: None,
            berbuka_end_time: None,
        };

        if now < subuh_at {
            return snapshot;
        }

        if now < maghrib_at {
            let remaining = (maghrib_at - now).whole_seconds().max(0);
            snapshot.state = DisplayState::Countdown;
            snapshot.countdown_seconds = Some(remaining as u64);
        } else if now < berbuka_end {
            snapshot.state = DisplayState::Berbuka;
            snapshot.berbuka_video = berbuka_video.cloned();
            snapshot.berbuka_end_time = berbuka_end
                .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
                .ok();
        }

        snapshot
    }
}

fn unscheduled(tvc_videos: Vec<Video>) -> DisplayStateSnapshot {
    DisplayStateSnapshot {
        state: DisplayState::Tvc,
        countdown_seconds: None,
        subuh_time: None,
        maghrib_time: None,
        location: None,
        current_tvc_videos: tvc_videos,
        berbuka_video: None,
        berbuka_end_time: None,
    }
}
