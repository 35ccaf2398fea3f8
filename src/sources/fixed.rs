// src/sources/fixed.rs
//! Static sample payloads. No network, no clock: identical bytes on every call.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollEntry {
    pub party: &'static str,
    pub percentage: u32,
    pub change: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollsReport {
    pub data_source: &'static str,
    pub description: &'static str,
    pub polls: Vec<PollEntry>,
    pub poll_date: &'static str,
    pub sample_size: u32,
    pub note: &'static str,
}

pub fn polls() -> PollsReport {
    let p = |party: &'static str, percentage: u32, change: &'static str| PollEntry {
        party,
        percentage,
        change,
    };
    PollsReport {
        data_source: "YouGov UK Political Polling",
        description: "Latest UK voting intention polls",
        polls: vec![
            p("Conservative", 24, "-2"),
            p("Labour", 42, "+1"),
            p("Liberal Democrat", 12, "0"),
            p("Reform UK", 15, "+1"),
            p("Green", 6, "0"),
        ],
        poll_date: "2024-01-15",
        sample_size: 1742,
        note: "This is sample data - YouGov doesn't provide a free public API",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FoodbankStats {
    pub data_source: &'static str,
    pub description: &'static str,
    pub period: &'static str,
    pub parcels_distributed: u32,
    pub parcels_for_children: u32,
    pub year_on_year_change: &'static str,
    pub middlington_foodbanks: u32,
    pub note: &'static str,
}

pub fn foodbank_stats() -> FoodbankStats {
    FoodbankStats {
        data_source: "Trussell Trust End of Year Stats",
        description: "Emergency food parcels distributed by the Trussell Trust network",
        period: "April 2023 - March 2024",
        parcels_distributed: 3_120_000,
        parcels_for_children: 1_100_000,
        year_on_year_change: "+4%",
        middlington_foodbanks: 3,
        note: "This is static sample data",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SampleWeather {
    pub location: &'static str,
    pub forecast: &'static str,
    pub temperature_c: i32,
    pub wind_speed_kph: u32,
    pub warning: &'static str,
}

pub fn sample_weather() -> SampleWeather {
    SampleWeather {
        location: "Middlington",
        forecast: "Rainy",
        temperature_c: 13,
        wind_speed_kph: 22,
        warning: "Yellow weather warning for localised flooding",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TikTokTrends {
    pub tiktok_trends: [&'static str; 5],
}

pub fn tiktok_trends() -> TikTokTrends {
    TikTokTrends {
        tiktok_trends: [
            "Air fryer pasta recipes",
            "Skip meals to save money challenge",
            "POV: Budget Mum UK",
            "Corner shop hauls",
            "Quiet quitting remix",
        ],
    }
}
