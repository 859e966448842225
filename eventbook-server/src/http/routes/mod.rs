//! Route handlers

pub mod bookings;
pub mod health;
pub mod widget;
