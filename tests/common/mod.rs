#![allow(dead_code)]

//! Synthetic save images.
//!
//! Real saves carry personal data and cannot be shipped as fixtures, so tests
//! build images field by field at the documented offsets.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use wiifit_sync::sans::layout::{MEASUREMENT_OFFSET, MEASUREMENT_SIZE, PROFILE_SIZE};

const NAME_OFFSET: usize = 0x08;
const HEIGHT_OFFSET: usize = 0x1F;
const BIRTH_OFFSET: usize = 0x20;

/// Pack a date the way body tests store it. `month` is one-based.
pub fn pack_date(year: u32, month: u32, day: u32, hour: u32, minute: u32) -> u32 {
    (year << 20) | ((month - 1) << 16) | (day << 11) | (hour << 6) | minute
}

/// One body-test record, in stored units.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    pub date: u32,
    pub weight: u16,
    pub bmi: u16,
    pub balance: u16,
    pub extended: u8,
}

impl Record {
    pub fn weighing(weight: u16) -> Self {
        Self {
            date: 0x7E74_55CF,
            weight,
            bmi: 2210,
            balance: 510,
            extended: 0,
        }
    }
}

/// A profile slot under construction.
pub struct Slot {
    bytes: Vec<u8>,
    records: usize,
}

impl Slot {
    /// A slot with a name, 165 cm tall, born 1990-05-10, with no body tests.
    pub fn named(name: &str) -> Self {
        Self::blank().name(name).height(165).birth([0x19, 0x90], 0x05, 0x10)
    }

    /// An unused slot.
    pub fn blank() -> Self {
        Self {
            bytes: vec![0; PROFILE_SIZE],
            records: 0,
        }
    }

    /// Write up to ten UTF-16BE units of a name, zero-terminated if shorter.
    pub fn name(mut self, name: &str) -> Self {
        let units: Vec<u16> = name.encode_utf16().collect();
        self.name_units(&units);
        self
    }

    pub fn name_units(&mut self, units: &[u16]) {
        let field = &mut self.bytes[NAME_OFFSET..NAME_OFFSET + 20];
        field.fill(0);
        for (dst, unit) in field.chunks_exact_mut(2).zip(units) {
            dst.copy_from_slice(&unit.to_be_bytes());
        }
    }

    pub fn height(mut self, cm: u8) -> Self {
        self.bytes[HEIGHT_OFFSET] = cm;
        self
    }

    /// Birth date as raw binary-coded decimal bytes.
    pub fn birth(mut self, year: [u8; 2], month: u8, day: u8) -> Self {
        self.bytes[BIRTH_OFFSET..BIRTH_OFFSET + 2].copy_from_slice(&year);
        self.bytes[BIRTH_OFFSET + 2] = month;
        self.bytes[BIRTH_OFFSET + 3] = day;
        self
    }

    /// Append a record to the measurement table.
    pub fn record(mut self, record: Record) -> Self {
        let start = MEASUREMENT_OFFSET + self.records * MEASUREMENT_SIZE;
        let r = &mut self.bytes[start..start + MEASUREMENT_SIZE];

        r[0..4].copy_from_slice(&record.date.to_be_bytes());
        r[4..6].copy_from_slice(&record.weight.to_be_bytes());
        r[6..8].copy_from_slice(&record.bmi.to_be_bytes());
        r[8..10].copy_from_slice(&record.balance.to_be_bytes());
        r[10] = record.extended;

        self.records += 1;
        self
    }

    /// Append `n` plausible records.
    pub fn records(self, n: usize) -> Self {
        (0..n).fold(self, |slot, i| slot.record(Record::weighing(600 + (i % 100) as u16)))
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Concatenate slots into a save image.
pub fn save(slots: impl IntoIterator<Item = Slot>) -> Vec<u8> {
    slots.into_iter().flat_map(Slot::build).collect()
}

/// A scratch directory, removed when dropped.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(label: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let path = std::env::temp_dir().join(format!(
            "wiifit-sync-{label}-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed),
        ));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Write a file at a slash-separated path below the directory.
    pub fn write(&self, path: &str, contents: &[u8]) -> PathBuf {
        let path = self.0.join(path.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
