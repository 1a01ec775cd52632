//! Conversion from MOTIS connections to domain types.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

use crate::domain::{Coordinate, Itinerary, Leg, Place, RouteType, Stop};

use super::super::convert::{ConversionError, non_empty, valid_hex_color};
use super::types::{Connection, MotisStop, MoveType, Transport};

/// MOTIS service classes.
mod clasz {
    pub const AIR: u8 = 0;
    pub const HIGH_SPEED: u8 = 1;
    pub const LONG_DISTANCE: u8 = 2;
    pub const COACH: u8 = 3;
    pub const NIGHT: u8 = 4;
    pub const REGIONAL_FAST: u8 = 5;
    pub const REGIONAL: u8 = 6;
    pub const METRO: u8 = 7;
    pub const SUBWAY: u8 = 8;
    pub const TRAM: u8 = 9;
    pub const BUS: u8 = 10;
    pub const SHIP: u8 = 11;
    pub const OTHER: u8 = 12;
}

/// Extended route type codes for classes without a basic GTFS type.
const AIR_SERVICE: u16 = 1100;
const MISCELLANEOUS_SERVICE: u16 = 1700;

pub fn route_type(class: u8) -> Option<RouteType> {
    Some(match class {
        clasz::AIR => RouteType::Other(AIR_SERVICE),
        clasz::HIGH_SPEED
        | clasz::LONG_DISTANCE
        | clasz::NIGHT
        | clasz::REGIONAL_FAST
        | clasz::REGIONAL => RouteType::Train,
        clasz::COACH | clasz::BUS => RouteType::Bus,
        clasz::METRO | clasz::SUBWAY => RouteType::Subway,
        clasz::TRAM => RouteType::Tram,
        clasz::SHIP => RouteType::Ferry,
        clasz::OTHER => RouteType::Other(MISCELLANEOUS_SERVICE),
        _ => return None,
    })
}

/// Service classes to request for a route type.
pub fn claszes(route_type: RouteType) -> &'static [u8] {
    match route_type {
        RouteType::Bus => &[clasz::COACH, clasz::BUS],
        RouteType::Tram => &[clasz::TRAM],
        RouteType::Train => &[
            clasz::HIGH_SPEED,
            clasz::LONG_DISTANCE,
            clasz::NIGHT,
            clasz::REGIONAL,
            clasz::REGIONAL_FAST,
        ],
        RouteType::Subway => &[clasz::METRO, clasz::SUBWAY],
        RouteType::Ferry => &[clasz::SHIP],
        RouteType::Other(AIR_SERVICE) => &[clasz::AIR],
        _ => &[],
    }
}

/// Converts a timestamp in seconds to the zone's local offset.
fn local_time(secs: i64, tz: Tz) -> Result<DateTime<FixedOffset>, ConversionError> {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&tz).fixed_offset())
        .ok_or(ConversionError::InvalidTimestamp(secs))
}

fn optional_time(secs: i64, tz: Tz) -> Result<Option<DateTime<FixedOffset>>, ConversionError> {
    if secs > 0 {
        local_time(secs, tz).map(Some)
    } else {
        Ok(None)
    }
}

/// Stops, with the `START`/`END` pseudo stations named after the query's
/// endpoints.
fn convert_stop(
    stop: &MotisStop,
    origin: &Place,
    destination: &Place,
    tz: Tz,
) -> Result<Stop, ConversionError> {
    let name = match stop.station.id.as_str() {
        "START" => origin.name.clone(),
        "END" => destination.name.clone(),
        _ => stop.station.name.clone(),
    };
    let mut converted = Stop::new(name, Coordinate::new(stop.station.pos.lat, stop.station.pos.lng));
    converted.arrival = optional_time(stop.arrival.time, tz)?;
    converted.departure = optional_time(stop.departure.time, tz)?;
    Ok(converted)
}

pub fn convert_connection(
    connection: &Connection,
    origin: &Place,
    destination: &Place,
    tz: Tz,
) -> Result<Itinerary, ConversionError> {
    let stops = connection
        .stops
        .iter()
        .map(|stop| convert_stop(stop, origin, destination, tz))
        .collect::<Result<Vec<_>, _>>()?;

    let legs = connection
        .transports
        .iter()
        .map(|transport| convert_transport(transport, &stops))
        .collect::<Result<Vec<_>, _>>()?;

    let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
        return Err(ConversionError::EmptyItinerary);
    };
    let departure = first.departure.ok_or(ConversionError::OutOfRange {
        what: "departure",
        index: 0,
    })?;
    let arrival = last.arrival.ok_or(ConversionError::OutOfRange {
        what: "arrival",
        index: legs.len() - 1,
    })?;

    Itinerary::new(legs, departure, arrival).map_err(|_| ConversionError::EmptyItinerary)
}

fn stop_at(stops: &[Stop], index: usize) -> Result<&Stop, ConversionError> {
    stops
        .get(index)
        .ok_or(ConversionError::OutOfRange { what: "stops", index })
}

fn convert_transport(transport: &Transport, stops: &[Stop]) -> Result<Leg, ConversionError> {
    let range = &transport.movement.range;
    let from = stop_at(stops, range.from)?;
    let to = stop_at(stops, range.to)?;
    let departure = from.departure.ok_or(ConversionError::OutOfRange {
        what: "departure",
        index: range.from,
    })?;
    let arrival = to.arrival.ok_or(ConversionError::OutOfRange {
        what: "arrival",
        index: range.to,
    })?;

    if transport.move_type == MoveType::Walk {
        let distance = from.coordinate.distance_to(&to.coordinate);
        let duration = (arrival - departure).num_seconds() as f64;
        return Ok(Leg::walk(
            from.name.clone(),
            from.coordinate,
            to.name.clone(),
            to.coordinate,
            distance,
            duration,
        )
        .with_times(departure, arrival));
    }

    let movement = &transport.movement;
    let route = non_empty(movement.line_id.clone())
        .or_else(|| non_empty(movement.name.clone()))
        .unwrap_or_default();
    let mut leg = Leg::transit(
        route,
        from.name.clone(),
        from.coordinate,
        to.name.clone(),
        to.coordinate,
        departure,
        arrival,
    );
    leg.route_type = movement.clasz.and_then(route_type);
    leg.color = valid_hex_color(movement.route_color.clone());
    leg.text_color = valid_hex_color(movement.route_text_color.clone());
    leg.agency_name = non_empty(movement.provider.clone());
    leg.headsign = non_empty(movement.direction.clone());
    leg.intermediate_stops = stops
        .get(range.from + 1..=range.to)
        .map(<[Stop]>::to_vec)
        .unwrap_or_default();
    Ok(leg)
}
