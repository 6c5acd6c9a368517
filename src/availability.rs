// ABOUTME: Converts per-slot room occupancy flags into human-readable free time ranges
// ABOUTME: Pure functions over fixed 30-minute slots; no I/O and no clock access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Time-slot range aggregation
//!
//! A room's day is a fixed-length array of flags, one per 30-minute slot,
//! where index `i` starts at `start + i * 30min`. A flag of `0` means free and
//! any other value means occupied. [`free_ranges`] lazily yields the maximal
//! runs of free slots as [`TimeRange`]s in ascending order.

use chrono::{NaiveDateTime, TimeDelta};

use crate::models::{TimeRange, SLOT_AVAILABLE, SLOT_MINUTES};

/// Iterator over the free ranges of a slot array
#[derive(Debug, Clone)]
pub struct FreeRanges<'a> {
    slots: &'a [u8],
    start: NaiveDateTime,
    index: usize,
}

impl FreeRanges<'_> {
    #[allow(clippy::cast_possible_wrap)]
    fn slot_instant(&self, index: usize) -> NaiveDateTime {
        self.start + TimeDelta::minutes(SLOT_MINUTES * index as i64)
    }
}

impl Iterator for FreeRanges<'_> {
    type Item = TimeRange;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.slots.len() && self.slots[self.index] != SLOT_AVAILABLE {
            self.index += 1;
        }
        if self.index >= self.slots.len() {
            return None;
        }

        let opened_at = self.index;
        while self.index < self.slots.len() && self.slots[self.index] == SLOT_AVAILABLE {
            self.index += 1;
        }

        Some(TimeRange {
            start: self.slot_instant(opened_at),
            end: self.slot_instant(self.index),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.slots.len().saturating_sub(self.index);
        (0, Some(remaining.div_ceil(2)))
    }
}

/// Lazily yield the free ranges of `slots`, where slot 0 begins at `start`
#[must_use]
pub fn free_ranges(slots: &[u8], start: NaiveDateTime) -> FreeRanges<'_> {
    FreeRanges {
        slots,
        start,
        index: 0,
    }
}

/// Collect the free ranges of `slots` into a vector
///
/// Ranges are disjoint, ascending, maximal and each a positive multiple of
/// 30 minutes. All-occupied input yields an empty vector; all-free input
/// yields one range spanning `[start, start + len * 30min)`.
#[must_use]
pub fn compute_free_ranges(slots: &[u8], start: NaiveDateTime) -> Vec<TimeRange> {
    free_ranges(slots, start).collect()
}

/// Whether any slot is free
#[must_use]
pub fn has_free_slot(slots: &[u8]) -> bool {
    slots.iter().any(|&slot| slot == SLOT_AVAILABLE)
}

/// Render ranges as "09:30AM - 11:00AM, 01:00PM - 02:00PM"
#[must_use]
pub fn format_ranges(ranges: &[TimeRange]) -> String {
    ranges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
