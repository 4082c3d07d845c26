// src/tournament/mod.rs

pub mod lobby;
pub mod pairing;

pub use lobby::Manager;
pub use pairing::{plan_pairings, Candidate, Pairing};
