use chrono::NaiveTime;

use crate::domain::{Appointment, AppointmentId, TimeInterval, WorkingHours};
use crate::scheduling::clock;

/// One cell of the fixed-step day grid.
///
/// `appointment` is the confirmed appointment covering this instant, if any;
/// `starts_appointment` is set only on the first cell covering it so a
/// rendering layer shows each appointment once. `past` marks cells starting
/// at or before the current minute on the queried day.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSlot {
    pub start: NaiveTime,
    pub appointment: Option<AppointmentId>,
    pub starts_appointment: bool,
    pub past: bool,
}

/// Computes the ordered free ranges of a day: the gaps between occupied
/// intervals within working hours, each at least `min_gap_minutes` long.
///
/// `now` is the wall-clock time when the queried date is today; nothing is
/// offered at or before the current minute, so the sweep starts at the first
/// `step_minutes` boundary strictly after it.
pub fn free_ranges(
    hours: &WorkingHours,
    occupied: &[TimeInterval],
    now: Option<NaiveTime>,
    step_minutes: u32,
    min_gap_minutes: u32,
) -> Vec<TimeInterval> {
    let Some(window) = hours.open_interval() else {
        return Vec::new();
    };
    if step_minutes == 0 {
        return Vec::new();
    }

    let close = clock::to_minutes(window.end);
    let mut cursor = clock::to_minutes(window.start);
    if let Some(now) = now {
        cursor = cursor.max(first_bookable_minute(now, step_minutes));
    }

    let mut busy: Vec<(u32, u32)> = occupied
        .iter()
        .map(|interval| {
            (
                clock::to_minutes(interval.start),
                clock::to_minutes(interval.end),
            )
        })
        .collect();
    busy.sort_unstable();

    let mut gaps: Vec<(u32, u32)> = Vec::new();
    for (start, end) in busy {
        if end <= cursor {
            continue;
        }
        if start >= close {
            break;
        }
        if start > cursor {
            gaps.push((cursor, start));
        }
        cursor = cursor.max(end);
        if cursor >= close {
            break;
        }
    }
    if cursor < close {
        gaps.push((cursor, close));
    }

    gaps.into_iter()
        .filter(|(start, end)| end - start >= min_gap_minutes)
        .filter_map(|(start, end)| interval_from_minutes(start, end))
        .collect()
}

/// Enumerates every `step_minutes`-aligned instant in the working window,
/// annotated for the grid/calendar view.
pub fn fixed_grid_slots(
    hours: &WorkingHours,
    appointments: &[Appointment],
    now: Option<NaiveTime>,
    step_minutes: u32,
) -> Vec<GridSlot> {
    let Some(window) = hours.open_interval() else {
        return Vec::new();
    };
    if step_minutes == 0 {
        return Vec::new();
    }

    let close = clock::to_minutes(window.end);
    let now_minute = now.map(clock::to_minutes);

    let mut slots = Vec::new();
    let mut cursor = clock::to_minutes(window.start);
    while cursor < close {
        let Ok(start) = clock::from_minutes(cursor) else {
            break;
        };
        let covering = appointments
            .iter()
            .filter(|appointment| appointment.is_active())
            .find(|appointment| appointment.interval.contains(start));
        let starts_appointment = covering.is_some_and(|appointment| {
            clock::to_minutes(appointment.interval.start) + step_minutes > cursor
        });
        slots.push(GridSlot {
            start,
            appointment: covering.map(|appointment| appointment.id),
            starts_appointment,
            past: now_minute.is_some_and(|now| cursor <= now),
        });
        cursor += step_minutes;
    }
    slots
}

/// Every `step_minutes`-aligned start time `t` within the range such that
/// `t + duration` still fits. A range shorter than the duration yields
/// nothing.
pub fn service_start_options(
    range: &TimeInterval,
    duration_minutes: u32,
    step_minutes: u32,
) -> Vec<NaiveTime> {
    if step_minutes == 0 || duration_minutes == 0 {
        return Vec::new();
    }

    let close = clock::to_minutes(range.end);
    let mut cursor = round_up(clock::to_minutes(range.start), step_minutes);

    let mut options = Vec::new();
    while cursor + duration_minutes <= close {
        if let Ok(start) = clock::from_minutes(cursor) {
            options.push(start);
        }
        cursor += step_minutes;
    }
    options
}

fn first_bookable_minute(now: NaiveTime, step_minutes: u32) -> u32 {
    (clock::to_minutes(now) / step_minutes + 1) * step_minutes
}

fn round_up(minute: u32, step_minutes: u32) -> u32 {
    minute.div_ceil(step_minutes) * step_minutes
}

fn interval_from_minutes(start: u32, end: u32) -> Option<TimeInterval> {
    TimeInterval::new(
        clock::from_minutes(start).ok()?,
        clock::from_minutes(end).ok()?,
    )
    .ok()
}
