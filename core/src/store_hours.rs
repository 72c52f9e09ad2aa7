// sauda_core/src/store_hours.rs

//! Store-hours gate: does a store accept new orders right now?
//!
//! A pure predicate over the store's `is_open` flag and its optional
//! "HH:MM" opening/closing times. The workflow engine consults this before
//! accepting an order or opening a payment session.

use chrono::{NaiveTime, Timelike};

/// Minutes since midnight for an "HH:MM" string. Anything unparsable is
/// treated as an absent bound.
fn minutes_of(time: &str) -> Option<u32> {
  let (h, m) = time.split_once(':')?;
  let h: u32 = h.trim().parse().ok()?;
  let m: u32 = m.trim().parse().ok()?;
  if h > 23 || m > 59 {
    return None;
  }
  Some(h * 60 + m)
}

/// Whether new orders are accepted for a store.
///
/// `is_open == false` always closes the store. If either time bound is absent
/// (or unparsable), the flag alone governs. A closing time numerically at or
/// before the opening time means the window crosses midnight, so the closing
/// bound is pushed out by 24 hours before comparing.
pub fn accepts_orders(is_open: bool, opening: Option<&str>, closing: Option<&str>, now: NaiveTime) -> bool {
  if !is_open {
    return false;
  }
  let (open_mins, close_mins) = match (opening.and_then(minutes_of), closing.and_then(minutes_of)) {
    (Some(o), Some(c)) => (o, c),
    _ => return true,
  };
  let now_mins = now.hour() * 60 + now.minute();
  let close_mins = if close_mins <= open_mins { close_mins + 24 * 60 } else { close_mins };
  now_mins >= open_mins && now_mins < close_mins
}
