//! Domain logic for the tourist destination manager.
//!
//! Nothing in this crate touches the database. Persistence lives in
//! `tdm_db`; the image-asset lifecycle that combines both lives in
//! `tdm_media`.

pub mod destination;
pub mod error;
pub mod imaging;
pub mod naming;
pub mod slug;
pub mod storage;
pub mod types;
pub mod units;
