//! Conversion from OpenTripPlanner responses to domain types.

use tracing::warn;

use crate::domain::{Coordinate, Itinerary, Leg, RouteType, Stop, decode_path};

use super::super::convert::{ConversionError, datetime_from_millis, non_empty, valid_hex_color};
use super::types::{OtpItinerary, OtpLeg, OtpPlace, TripPlan};

/// Converts every itinerary in a plan.
///
/// Itineraries that fail to convert are logged and skipped.
pub fn convert_plan(plan: TripPlan) -> Vec<Itinerary> {
    let mut itineraries = Vec::with_capacity(plan.itineraries.len());
    for itinerary in plan.itineraries {
        match convert_itinerary(itinerary) {
            Ok(converted) => itineraries.push(converted),
            Err(e) => warn!(error = %e, "skipping itinerary"),
        }
    }
    itineraries
}

pub fn convert_itinerary(itinerary: OtpItinerary) -> Result<Itinerary, ConversionError> {
    let (Some(first), Some(last)) = (itinerary.legs.first(), itinerary.legs.last()) else {
        return Err(ConversionError::EmptyItinerary);
    };
    let departure = datetime_from_millis(itinerary.start_time, offset_secs(first))?;
    let arrival = datetime_from_millis(itinerary.end_time, offset_secs(last))?;

    let legs = itinerary
        .legs
        .into_iter()
        .map(convert_leg)
        .collect::<Result<Vec<_>, _>>()?;

    let converted =
        Itinerary::new(legs, departure, arrival).map_err(|_| ConversionError::EmptyItinerary)?;
    Ok(match itinerary.transfers {
        Some(transfers) => converted.with_transfers(transfers),
        None => converted,
    })
}

fn offset_secs(leg: &OtpLeg) -> i32 {
    (leg.agency_time_zone_offset / 1000) as i32
}

fn coordinate(place: &OtpPlace) -> Coordinate {
    Coordinate::new(place.lat, place.lon)
}

pub fn convert_leg(leg: OtpLeg) -> Result<Leg, ConversionError> {
    let offset = offset_secs(&leg);
    let departure = datetime_from_millis(leg.start_time, offset)?;
    let arrival = datetime_from_millis(leg.end_time, offset)?;

    let mut converted = if leg.transit_leg {
        let route = non_empty(leg.route.clone())
            .or_else(|| non_empty(leg.trip_short_name.clone()))
            .unwrap_or_default();
        Leg::transit(
            route,
            leg.from.name.clone(),
            coordinate(&leg.from),
            leg.to.name.clone(),
            coordinate(&leg.to),
            departure,
            arrival,
        )
    } else {
        Leg::walk(
            leg.from.name.clone(),
            coordinate(&leg.from),
            leg.to.name.clone(),
            coordinate(&leg.to),
            leg.distance,
            leg.duration,
        )
        .with_times(departure, arrival)
    };

    converted.distance = leg.distance;
    converted.duration = leg.duration;
    converted.route_id = non_empty(leg.route_id);
    converted.route_type = leg.route_type.map(RouteType::from_code);
    converted.color = valid_hex_color(leg.route_color);
    converted.text_color = valid_hex_color(leg.route_text_color);
    converted.headsign = non_empty(leg.headsign);
    converted.agency_name = non_empty(leg.agency_name);
    converted.agency_url = non_empty(leg.agency_url);
    converted.trip_short_name = non_empty(leg.trip_short_name);

    if let Some(geometry) = leg.leg_geometry {
        let path = decode_path(&geometry.points).map_err(ConversionError::InvalidPolyline)?;
        converted.set_polyline(path);
    }

    if leg.transit_leg {
        let mut stops = leg
            .intermediate_stops
            .iter()
            .map(|stop| convert_stop(stop, offset))
            .collect::<Result<Vec<_>, _>>()?;
        // the alighting stop closes the list
        let mut last = Stop::new(leg.to.name.clone(), coordinate(&leg.to));
        last.arrival = Some(arrival);
        stops.push(last);
        converted.intermediate_stops = stops;
    }

    Ok(converted)
}

fn convert_stop(stop: &OtpPlace, offset: i32) -> Result<Stop, ConversionError> {
    let mut converted = Stop::new(stop.name.clone(), coordinate(stop));
    converted.arrival = stop
        .arrival
        .map(|ms| datetime_from_millis(ms, offset))
        .transpose()?;
    converted.departure = stop
        .departure
        .map(|ms| datetime_from_millis(ms, offset))
        .transpose()?;
    Ok(converted)
}
