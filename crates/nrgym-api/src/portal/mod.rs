// Client portal API
//
// Session-cookie authenticated JSON endpoints under `/clientportal2/`.

pub mod auth;
pub mod bookings;
pub mod client;
pub mod clubs;
pub mod contracts;
pub mod models;
pub mod profile;

pub use client::PortalClient;
pub use models::{
    Booking, ClubOccupancy, Contract, Contracts, Identity, NextPayment, Occupancy, Profile,
    parse_portal_datetime,
};
