//! MOTIS 1.x intermodal routing response types.
//!
//! Times are seconds since the epoch; `0` means "not applicable" (no
//! arrival at the first stop, no departure from the last).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RoutingResponse {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
pub struct Connection {
    pub stops: Vec<MotisStop>,
    pub transports: Vec<Transport>,
}

impl Connection {
    /// True for a connection that is one walk and nothing else.
    pub fn is_walking_only(&self) -> bool {
        matches!(self.transports.as_slice(), [only] if only.move_type == MoveType::Walk)
    }
}

#[derive(Debug, Deserialize)]
pub struct MotisStop {
    pub station: Station,
    pub arrival: EventInfo,
    pub departure: EventInfo,
}

#[derive(Debug, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct EventInfo {
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MoveType {
    Walk,
    Transport,
}

#[derive(Debug, Deserialize)]
pub struct Transport {
    pub move_type: MoveType,
    #[serde(rename = "move")]
    pub movement: Move,
}

/// The payload of a transport; fields beyond the range are only present on
/// `Transport` moves.
#[derive(Debug, Deserialize)]
pub struct Move {
    pub range: Range,
    #[serde(default)]
    pub clasz: Option<u8>,
    #[serde(default)]
    pub line_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[serde(default)]
    pub route_text_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}
