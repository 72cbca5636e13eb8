//! Booking status machine.
//!
//! ```text
//! pending ──► confirmed ──► checked_in ──► checked_out
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! `checked_out`, `cancelled` and `completed` are terminal. `completed` is only ever read back from
//! storage.

use crate::db::models::bookings::BookingStatus;

/// Who may drive a transition. Admins may drive every legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The guest the booking belongs to
    Guest,
    /// The manager of the booking's hotel
    HotelManager,
}

/// The party allowed to move a booking from `from` to `to`, or `None` if the move is illegal.
pub fn transition_party(from: BookingStatus, to: BookingStatus) -> Option<Party> {
    use BookingStatus::*;

    match (from, to) {
        (Pending, Confirmed) => Some(Party::HotelManager),
        (Pending | Confirmed, Cancelled) => Some(Party::Guest),
        (Confirmed, CheckedIn) | (CheckedIn, CheckedOut) => Some(Party::HotelManager),
        _ => None,
    }
}

/// How the caller relates to a booking
#[derive(Debug, Clone, Copy, Default)]
pub struct Relationship {
    pub is_guest: bool,
    pub manages_hotel: bool,
    pub is_admin: bool,
}

impl Relationship {
    pub fn can_see(&self) -> bool {
        self.is_guest || self.manages_hotel || self.is_admin
    }

    pub fn may_act_as(&self, party: Party) -> bool {
        self.is_admin
            || match party {
                Party::Guest => self.is_guest,
                Party::HotelManager => self.manages_hotel,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    const ALL: [BookingStatus; 6] = [Pending, Confirmed, CheckedIn, CheckedOut, Cancelled, Completed];

    #[test]
    fn test_legal_transitions() {
        assert_eq!(transition_party(Pending, Confirmed), Some(Party::HotelManager));
        assert_eq!(transition_party(Pending, Cancelled), Some(Party::Guest));
        assert_eq!(transition_party(Confirmed, Cancelled), Some(Party::Guest));
        assert_eq!(transition_party(Confirmed, CheckedIn), Some(Party::HotelManager));
        assert_eq!(transition_party(CheckedIn, CheckedOut), Some(Party::HotelManager));
    }

    #[test]
    fn test_illegal_transitions() {
        assert_eq!(transition_party(CheckedOut, Pending), None);
        assert_eq!(transition_party(CheckedOut, Cancelled), None);
        assert_eq!(transition_party(Cancelled, CheckedIn), None);
        assert_eq!(transition_party(CheckedIn, Cancelled), None);
        assert_eq!(transition_party(Pending, CheckedIn), None);
        assert_eq!(transition_party(Confirmed, Pending), None);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|status| status.is_terminal()) {
            for to in ALL {
                assert_eq!(transition_party(from, to), None, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_nothing_moves_back_to_pending() {
        for from in ALL {
            assert_eq!(transition_party(from, Pending), None);
        }
    }

    #[test]
    fn test_relationship() {
        let guest = Relationship {
            is_guest: true,
            ..Default::default()
        };
        assert!(guest.may_act_as(Party::Guest));
        assert!(!guest.may_act_as(Party::HotelManager));

        let admin = Relationship {
            is_admin: true,
            ..Default::default()
        };
        assert!(admin.may_act_as(Party::Guest) && admin.may_act_as(Party::HotelManager));
        assert!(!Relationship::default().can_see());
    }
}
