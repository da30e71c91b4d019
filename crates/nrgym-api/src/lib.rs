// nrgym-api: async client for the NRG gym client portal

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod portal;
pub mod transport;

pub use auth::{AUTH_COOKIE, Credentials, SessionToken};
pub use endpoint::{DEFAULT_BASE_URL, FALLBACK_CLUB_ID};
pub use error::{Error, ErrorKind};
pub use portal::{
    Booking, ClubOccupancy, Contract, Contracts, Identity, NextPayment, Occupancy, PortalClient,
    Profile, parse_portal_datetime,
};
pub use transport::TransportConfig;
