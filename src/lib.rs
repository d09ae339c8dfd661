#![deny(clippy::all)]

//! A discord bot that watches the iRacing Data API for tracked drivers and
//! posts their race results to configured channels.

pub mod client;
pub mod config;
pub mod db;
pub mod iracing;
pub mod logging;
pub mod poller;
pub mod results;
pub mod tracking;
