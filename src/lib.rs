//! Automated weekday pilates reservation for the mbgym booking site.
//!
//! The site opens each class exactly seven days ahead at a fixed time, and
//! popular slots fill within seconds. This crate logs in as a member,
//! waits for the window, finds the class row in the day's timetable and
//! submits the reservation (or joins the waitlist), then writes a single
//! JSON result artifact describing how the run ended.

pub mod app;
pub mod booking;
pub mod cli;
pub mod config;
pub mod fmt;
pub mod logging;
pub mod report;
pub mod scan;
pub mod schedule;
pub mod site;
