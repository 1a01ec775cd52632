//! Itinerary type.
//!
//! An `Itinerary` is one complete travel option: an ordered, non-empty
//! sequence of legs plus the overall departure and arrival.

use chrono::{DateTime, Duration, FixedOffset};

use super::{BoundingBox, DomainError, Leg};

/// Time between finishing a leading walk and the departure of the first
/// transit leg, in seconds.
pub const WALK_SLACK_SECS: i64 = 120;

/// Converts fractional seconds into a `chrono::Duration`, rounded to the
/// millisecond.
pub(crate) fn seconds(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1000.0).round() as i64)
}

/// A complete travel option.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs are spatially chained (`legs[i].to ≈ legs[i + 1].from`)
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    legs: Vec<Leg>,
    departure: DateTime<FixedOffset>,
    arrival: DateTime<FixedOffset>,
    /// Duration in seconds.
    duration: f64,
    transfers: u32,
}

impl Itinerary {
    /// Constructs an itinerary from its legs and overall times.
    ///
    /// The transfer count defaults to one less than the number of transit
    /// legs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{FixedOffset, TimeZone};
    /// use transit_router::domain::{Coordinate, Itinerary, Leg};
    ///
    /// let tz = FixedOffset::east_opt(0).unwrap();
    /// let dep = tz.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    /// let arr = tz.with_ymd_and_hms(2024, 3, 15, 10, 20, 0).unwrap();
    ///
    /// let a = Coordinate::new(0.0, 0.0);
    /// let b = Coordinate::new(0.0, 0.05);
    /// let leg = Leg::transit("4", "A", a, "B", b, dep, arr);
    ///
    /// let itinerary = Itinerary::new(vec![leg], dep, arr).unwrap();
    /// assert_eq!(itinerary.duration(), 1200.0);
    /// assert!(!itinerary.is_walking_only());
    /// ```
    pub fn new(
        legs: Vec<Leg>,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
    ) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        let transfers = legs
            .iter()
            .filter(|leg| leg.is_transit)
            .count()
            .saturating_sub(1) as u32;

        Ok(Self {
            legs,
            departure,
            arrival,
            duration: (arrival - departure).num_milliseconds() as f64 / 1000.0,
            transfers,
        })
    }

    /// Overrides the transfer count reported by the backend.
    pub fn with_transfers(mut self, transfers: u32) -> Self {
        self.transfers = transfers;
        self
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn legs_mut(&mut self) -> &mut [Leg] {
        &mut self.legs
    }

    /// Replaces the leg sequence.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty; the itinerary is left unchanged.
    pub fn replace_legs(&mut self, legs: Vec<Leg>) -> Result<(), DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }
        self.legs = legs;
        Ok(())
    }

    pub fn departure(&self) -> DateTime<FixedOffset> {
        self.departure
    }

    pub fn arrival(&self) -> DateTime<FixedOffset> {
        self.arrival
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    /// Returns true if the itinerary is a single non-transit leg.
    pub fn is_walking_only(&self) -> bool {
        matches!(self.legs.as_slice(), [leg] if !leg.is_transit)
    }

    /// Union of the legs' bounding boxes.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::union(self.legs.iter().map(Leg::bbox).collect::<Vec<_>>().iter())
            .unwrap_or_default()
    }

    /// Departure of the first transit leg.
    pub fn transit_departure(&self) -> Option<DateTime<FixedOffset>> {
        self.legs.iter().find(|l| l.is_transit)?.departure
    }

    /// Arrival of the last transit leg.
    pub fn transit_arrival(&self) -> Option<DateTime<FixedOffset>> {
        self.legs.iter().rev().find(|l| l.is_transit)?.arrival
    }

    /// Re-times walking legs from their neighbours, then re-derives the
    /// itinerary's departure, arrival and duration from the legs.
    ///
    /// A leading walk ends [`WALK_SLACK_SECS`] before the following leg
    /// departs. Any other walk starts when the previous leg arrives. Walks
    /// take the time zone offset of the leg they are timed against.
    pub fn adjust_timings(&mut self) {
        if self.is_walking_only() {
            let departure = self.departure;
            let leg = &mut self.legs[0];
            let start = *leg.departure.get_or_insert(departure);
            leg.arrival = Some(start + seconds(leg.duration));
        } else {
            for i in 0..self.legs.len() {
                if self.legs[i].is_transit {
                    continue;
                }

                let walk = seconds(self.legs[i].duration);
                let (departure, arrival) = if i == 0 {
                    match self.legs.get(1).and_then(|next| next.departure) {
                        Some(next_departure) => {
                            let start = next_departure - walk - Duration::seconds(WALK_SLACK_SECS);
                            (start, start + walk)
                        }
                        None => continue,
                    }
                } else {
                    match self.legs[i - 1].arrival {
                        Some(previous_arrival) => (previous_arrival, previous_arrival + walk),
                        None => continue,
                    }
                };

                let leg = &mut self.legs[i];
                leg.departure = Some(departure);
                leg.arrival = Some(arrival);
            }
        }

        self.refresh_times_from_legs();
    }

    /// Takes the departure from the first leg and the arrival from the last
    /// leg, where known, and recomputes the duration.
    pub fn refresh_times_from_legs(&mut self) {
        if let Some(departure) = self.legs.first().and_then(|l| l.departure) {
            self.departure = departure;
        }
        if let Some(arrival) = self.legs.last().and_then(|l| l.arrival) {
            self.arrival = arrival;
        }
        self.duration = (self.arrival - self.departure).num_milliseconds() as f64 / 1000.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinate;
    use chrono::TimeZone;

    fn tz(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    fn at(offset: FixedOffset, h: u32, m: u32) -> DateTime<FixedOffset> {
        offset.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap()
    }

    fn c(lon: f64) -> Coordinate {
        Coordinate::new(0.0, lon)
    }

    #[test]
    fn empty_itinerary_rejected() {
        let t = at(tz(0), 10, 0);
        assert_eq!(
            Itinerary::new(Vec::new(), t, t),
            Err(DomainError::EmptyItinerary)
        );
    }

    #[test]
    fn walking_only_requires_single_walk() {
        let t = at(tz(0), 10, 0);
        let walk = Leg::walk("A", c(0.0), "B", c(0.001), 111.0, 111.0);
        let ride = Leg::transit("1", "B", c(0.001), "C", c(0.02), t, t + Duration::minutes(5));

        assert!(Itinerary::new(vec![walk.clone()], t, t).unwrap().is_walking_only());
        assert!(!Itinerary::new(vec![ride.clone()], t, t).unwrap().is_walking_only());
        assert!(
            !Itinerary::new(vec![walk, ride], t, t)
                .unwrap()
                .is_walking_only()
        );
    }

    #[test]
    fn transfers_default_from_transit_legs() {
        let t = at(tz(0), 10, 0);
        let r1 = Leg::transit("1", "A", c(0.0), "B", c(0.01), t, t + Duration::minutes(5));
        let w = Leg::walk("B", c(0.01), "C", c(0.011), 100.0, 100.0);
        let r2 = Leg::transit("2", "C", c(0.011), "D", c(0.03), t + Duration::minutes(10), t + Duration::minutes(20));
        let it = Itinerary::new(vec![r1, w, r2], t, t + Duration::minutes(20)).unwrap();
        assert_eq!(it.transfers(), 1);
        assert_eq!(it.clone().with_transfers(3).transfers(), 3);
    }

    #[test]
    fn adjust_timings_leading_and_trailing_walks() {
        let cet = tz(1);
        let dep = at(cet, 10, 0);
        let arr = at(cet, 10, 30);

        let lead = Leg::walk("home", c(0.0), "A", c(0.003), 300.0, 240.0);
        let ride = Leg::transit("1", "A", c(0.003), "B", c(0.05), dep, arr);
        let tail = Leg::walk("B", c(0.05), "work", c(0.052), 200.0, 180.0);

        let mut it = Itinerary::new(vec![lead, ride, tail], dep, arr).unwrap();
        it.adjust_timings();

        let legs = it.legs();
        // 10:00 - 240 s - 120 s
        assert_eq!(legs[0].departure, Some(at(cet, 9, 54)));
        assert_eq!(legs[0].arrival, Some(at(cet, 9, 58)));
        assert_eq!(legs[0].departure.unwrap().offset(), &cet);
        assert_eq!(legs[2].departure, Some(arr));
        assert_eq!(legs[2].arrival, Some(at(cet, 10, 33)));

        assert_eq!(it.departure(), at(cet, 9, 54));
        assert_eq!(it.arrival(), at(cet, 10, 33));
        assert_eq!(it.duration(), 39.0 * 60.0);
    }

    #[test]
    fn adjust_timings_walking_only() {
        let t = at(tz(2), 8, 0);
        let walk = Leg::walk("A", c(0.0), "B", c(0.01), 1100.0, 900.0);
        let mut it = Itinerary::new(vec![walk], t, t).unwrap();
        it.adjust_timings();

        assert_eq!(it.legs()[0].departure, Some(t));
        assert_eq!(it.arrival(), at(tz(2), 8, 15));
        assert_eq!(it.duration(), 900.0);
    }

    #[test]
    fn transit_cursors_skip_walks() {
        let t = at(tz(0), 12, 0);
        let w1 = Leg::walk("x", c(0.0), "A", c(0.001), 100.0, 100.0);
        let r1 = Leg::transit("1", "A", c(0.001), "B", c(0.01), t, t + Duration::minutes(5));
        let r2 = Leg::transit("2", "B", c(0.01), "C", c(0.02), t + Duration::minutes(7), t + Duration::minutes(15));
        let w2 = Leg::walk("C", c(0.02), "y", c(0.021), 100.0, 100.0);
        let it = Itinerary::new(vec![w1, r1, r2, w2], t, t).unwrap();

        assert_eq!(it.transit_departure(), Some(t));
        assert_eq!(it.transit_arrival(), Some(t + Duration::minutes(15)));

        let walk = Leg::walk("A", c(0.0), "B", c(0.01), 1100.0, 900.0);
        let walking = Itinerary::new(vec![walk], t, t).unwrap();
        assert_eq!(walking.transit_departure(), None);
    }

    #[test]
    fn bbox_is_union_of_legs() {
        let t = at(tz(0), 12, 0);
        let w = Leg::walk("x", Coordinate::new(1.0, 0.0), "A", c(0.001), 100.0, 100.0);
        let r = Leg::transit("1", "A", c(0.001), "B", Coordinate::new(-1.0, 2.0), t, t);
        let it = Itinerary::new(vec![w, r], t, t).unwrap();
        assert_eq!(it.bbox(), BoundingBox::new(-1.0, 0.0, 1.0, 2.0));
    }
}
