// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GATT service layout.
//!
//! The peripheral exposes one primary service with three characteristics:
//!
//! | Channel | Properties | Carries |
//! |---------|------------|---------|
//! | [`TX_CHARACTERISTIC`] | notify | replies and broadcasts |
//! | [`RX_CHARACTERISTIC`] | write | encoded commands |
//! | [`AUTH_CHARACTERISTIC`] | write | the shared secret |
//!
//! A transport binding routes characteristic writes through
//! [`LinkEvent::from_write`].

use uuid::{Uuid, uuid};

use crate::session::LinkEvent;

/// Primary service, advertised as a complete service list.
pub const SERVICE: Uuid = uuid!("35e2384d-09ba-40ec-8cc2-a491e7bcd763");

/// Status notifications to the peer.
pub const TX_CHARACTERISTIC: Uuid = uuid!("a9248655-7f1b-4e18-bf36-ad1ee859983f");

/// Command writes from the peer.
pub const RX_CHARACTERISTIC: Uuid = uuid!("9d5cb5f2-5eb2-4b7c-a5d4-21e61c9c6f36");

/// Auth writes from the peer.
pub const AUTH_CHARACTERISTIC: Uuid = uuid!("e58b4b34-daa6-4a79-8a4c-50d63e6e767f");

/// One characteristic of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GattChannel {
    /// Shared-secret writes.
    Auth,
    /// Command writes.
    Data,
    /// Outbound notifications.
    Status,
}

impl GattChannel {
    /// All channels in declaration order.
    pub const ALL: [Self; 3] = [Self::Status, Self::Data, Self::Auth];

    /// Maps a characteristic UUID to its channel.
    #[must_use]
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == *uuid)
    }

    /// Returns the characteristic UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::Auth => AUTH_CHARACTERISTIC,
            Self::Data => RX_CHARACTERISTIC,
            Self::Status => TX_CHARACTERISTIC,
        }
    }

    /// Returns `true` if the peer writes to this channel.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Auth | Self::Data)
    }

    /// Returns `true` if the peripheral notifies on this channel.
    #[must_use]
    pub const fn is_notify(&self) -> bool {
        matches!(self, Self::Status)
    }
}

impl LinkEvent {
    /// Builds the event for a write to `characteristic`.
    ///
    /// Returns `None` for characteristics the peer cannot write.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledlink::gatt::{AUTH_CHARACTERISTIC, TX_CHARACTERISTIC};
    /// use ledlink::session::LinkEvent;
    ///
    /// let event = LinkEvent::from_write(&AUTH_CHARACTERISTIC, b"key");
    /// assert_eq!(event, Some(LinkEvent::AuthWrite(b"key".to_vec())));
    /// assert_eq!(LinkEvent::from_write(&TX_CHARACTERISTIC, b"1"), None);
    /// ```
    #[must_use]
    pub fn from_write(characteristic: &Uuid, value: &[u8]) -> Option<Self> {
        match GattChannel::from_uuid(characteristic) {
            Some(GattChannel::Auth) => Some(Self::AuthWrite(value.to_vec())),
            Some(GattChannel::Data) => Some(Self::DataWrite(value.to_vec())),
            Some(GattChannel::Status) => {
                tracing::debug!("Ignoring write to the notify characteristic");
                None
            }
            None => {
                tracing::debug!(%characteristic, "Ignoring write to unknown characteristic");
                None
            }
        }
    }
}
