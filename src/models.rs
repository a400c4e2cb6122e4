//! Data types and associated functions and methods

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// A mountain pass as served by the pass API.
///
/// Any additional fields sent by the pass API (coordinates, climb category) are ignored.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Pass {
    /// Identifier, unique within the upstream dataset
    pub id: i64,
    /// Name of the pass
    pub name: String,
    /// Country in which the pass lies
    pub country: String,
    /// Elevation gain in metres
    pub ascent: u32,
}

impl Pass {
    /// Return a new Pass object.
    pub fn new(id: i64, name: &str, country: &str, ascent: u32) -> Self {
        Pass {
            id,
            name: name.to_string(),
            country: country.to_string(),
            ascent,
        }
    }
}

/// All passes returned by a single bulk fetch.
///
/// Order is not significant and duplicate IDs are not removed.
pub type PassCollection = Vec<Pass>;

/// Aggregation strategy tag attached to a [Summary]
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Serialize)]
pub enum Method {
    /// Every listed pass was fetched again by ID
    #[serde(rename = "inefficient-individual-requests")]
    #[strum(serialize = "inefficient-individual-requests")]
    IndividualRequests,
}

/// Summary statistics over a collection of passes
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Summary {
    /// Number of passes in the collection
    pub pass_count: usize,
    /// Sum of the ascent of every pass in the collection
    pub total_ascent: u64,
    /// Strategy that produced this summary, omitted for the bulk strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
}

impl Summary {
    /// Return a new Summary object.
    pub fn new(pass_count: usize, total_ascent: u64, method: Option<Method>) -> Self {
        Summary {
            pass_count,
            total_ascent,
            method,
        }
    }
}

/// Liveness check response
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Ping {
    /// Always true while the service is up
    pub ok: bool,
}
