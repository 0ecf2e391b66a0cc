//! Decoder for the body-test table inside a profile slot.
//!
//! The table has no length or terminator. Records are read at a fixed stride
//! until one holds an implausible weight, which is taken to mean the rest of
//! the table was never written.

use core::iter::FusedIterator;

use crate::model::Measurement;

use super::{
    Observer,
    codec::{decode_packed_date, read_u16_be},
    layout::{
        MAX_MEASUREMENTS, MAX_RAW_WEIGHT, MEASUREMENT_OFFSET, MEASUREMENT_SIZE, MIN_RAW_WEIGHT,
        MeasurementRecord, WEIGHT_OFFSET,
    },
};

/// Iterator over the measurements stored in a profile slot.
///
/// Ends at the first implausible weight, at the end of the slot, or after
/// [`MAX_MEASUREMENTS`] records, whichever comes first. Once ended it stays
/// ended.
pub struct Measurements<'a, O: ?Sized> {
    slot: &'a [u8],
    index: usize,
    done: bool,
    observer: &'a mut O,
}

impl<'a, O: Observer + ?Sized> Measurements<'a, O> {
    /// Start reading the table of a profile slot.
    pub fn new(slot: &'a [u8], observer: &'a mut O) -> Self {
        Self {
            slot,
            index: 0,
            done: false,
            observer,
        }
    }

    fn next_record(&mut self) -> Option<Measurement> {
        if self.index >= MAX_MEASUREMENTS {
            return None;
        }

        let start = MEASUREMENT_OFFSET + self.index * MEASUREMENT_SIZE;

        let Some(r) = self.slot.get(start..start + MEASUREMENT_SIZE) else {
            self.observer.end_of_slot(self.index);
            return None;
        };

        // The weight decides whether anything else in the record is read.
        let raw_weight = read_u16_be(&r[WEIGHT_OFFSET..]).ok()?;
        if !(MIN_RAW_WEIGHT..=MAX_RAW_WEIGHT).contains(&raw_weight) {
            self.observer.implausible_weight(self.index, raw_weight);
            return None;
        }

        let record = MeasurementRecord::read(r)?;
        self.index += 1;

        Some(Measurement {
            timestamp: decode_packed_date(u32::from_be_bytes(record.date)),
            weight_kg: f32::from(raw_weight) / 10.0,
            bmi: f32::from(u16::from_be_bytes(record.bmi)) / 100.0,
            balance_percent: f32::from(u16::from_be_bytes(record.balance)) / 10.0,
            has_extended_data: record.extended != 0,
        })
    }
}

impl<O: Observer + ?Sized> Iterator for Measurements<'_, O> {
    type Item = Measurement;

    fn next(&mut self) -> Option<Measurement> {
        if self.done {
            return None;
        }

        let next = self.next_record();
        self.done = next.is_none();
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(MAX_MEASUREMENTS - self.index))
        }
    }
}

impl<O: Observer + ?Sized> FusedIterator for Measurements<'_, O> {}
