//! Fixed-capacity arena of BLE devices keyed by MAC address.
//!
//! Slots are handed out in order and addressed through [`SlotHandle`]s. Once
//! every slot is occupied the next new device overwrites the oldest-inserted
//! entry; the cursor makes that choice explicit instead of relying on
//! whichever slot happens to be free.

use crate::config::BLE_DEVICE_CAPACITY;
use crate::messages::{BleDevice, MacAddress};

/// Index-based handle to a ring slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SlotHandle(usize);

impl SlotHandle {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Device data retained for the life of a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceEntry {
    pub device: BleDevice,
    pub sightings: u16,
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
}

/// Result of [`DeviceRing::upsert`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Upsert {
    /// First sighting; stored in a previously empty slot.
    Inserted(SlotHandle),
    /// Repeat sighting; the existing entry was refreshed.
    Updated(SlotHandle),
    /// First sighting on a full ring; the oldest entry was overwritten.
    Replaced {
        handle: SlotHandle,
        evicted: MacAddress,
    },
}

impl Upsert {
    #[must_use]
    pub const fn handle(self) -> SlotHandle {
        match self {
            Upsert::Inserted(handle) | Upsert::Updated(handle) => handle,
            Upsert::Replaced { handle, .. } => handle,
        }
    }

    /// Returns `true` when the device was not in the ring.
    #[must_use]
    pub const fn is_new(self) -> bool {
        !matches!(self, Upsert::Updated(_))
    }
}

/// Ring of discovered devices with upsert-by-MAC semantics.
#[derive(Clone, Debug)]
pub struct DeviceRing<const CAPACITY: usize = BLE_DEVICE_CAPACITY> {
    slots: [Option<DeviceEntry>; CAPACITY],
    cursor: usize,
    len: usize,
}

impl<const CAPACITY: usize> DeviceRing<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; CAPACITY],
            cursor: 0,
            len: 0,
        }
    }

    /// Drops every entry and rewinds the cursor.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.cursor = 0;
        self.len = 0;
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Linear lookup by MAC.
    #[must_use]
    pub fn find(&self, mac: &MacAddress) -> Option<SlotHandle> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|entry| entry.device.mac == *mac))
            .map(SlotHandle)
    }

    #[must_use]
    pub fn get(&self, handle: SlotHandle) -> Option<&DeviceEntry> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Inserts a new device or refreshes an existing one.
    ///
    /// Repeat sightings overwrite name, RSSI and flags with the latest values.
    pub fn upsert(&mut self, device: &BleDevice, now_ms: u64) -> Upsert {
        if let Some(handle) = self.find(&device.mac) {
            if let Some(entry) = self.slots[handle.0].as_mut() {
                if !device.name.is_empty() {
                    entry.device.name.clone_from(&device.name);
                }
                entry.device.rssi = device.rssi;
                entry.device.flags = device.flags;
                entry.sightings = entry.sightings.saturating_add(1);
                entry.last_seen_ms = now_ms;
            }
            return Upsert::Updated(handle);
        }

        if CAPACITY == 0 {
            // Nothing can be retained; every sighting is new.
            return Upsert::Replaced {
                handle: SlotHandle(0),
                evicted: device.mac,
            };
        }

        let index = self.cursor;
        self.cursor = (self.cursor + 1) % CAPACITY;

        let entry = DeviceEntry {
            device: device.clone(),
            sightings: 1,
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
        };

        match self.slots[index].replace(entry) {
            Some(previous) => Upsert::Replaced {
                handle: SlotHandle(index),
                evicted: previous.device.mac,
            },
            None => {
                self.len += 1;
                Upsert::Inserted(SlotHandle(index))
            }
        }
    }

    /// Iterates occupied slots from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        let (newer, older) = self.slots.split_at(self.cursor.min(CAPACITY));
        older.iter().chain(newer.iter()).filter_map(Option::as_ref)
    }
}

impl<const CAPACITY: usize> Default for DeviceRing<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
