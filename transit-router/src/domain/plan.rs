//! The shared result container for a query session.
//!
//! A `Plan` holds the current itineraries and broadcasts a [`PlanEvent`]
//! whenever its contents change or a search ends without results.

use std::cmp::Ordering;

use tokio::sync::broadcast;

use super::{BoundingBox, Itinerary};

/// Capacity of the event channel. Slow subscribers observe a lag error
/// rather than blocking producers.
const EVENT_CAPACITY: usize = 64;

/// The consumer-visible outcomes of a search that produced nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlanSignal {
    #[error("no transit provider covers this query")]
    NoProvider,

    #[error("no route found")]
    NoRouteFound,

    #[error("no more results")]
    NoMoreResults,

    #[error("request failed")]
    RequestFailed,
}

/// Notifications emitted by a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanEvent {
    /// Itineraries were replaced or extended.
    Updated,
    /// The plan was cleared.
    Reset,
    Signal(PlanSignal),
}

/// Ordering used when presenting itineraries.
///
/// Walking-only itineraries come first. The rest are sorted by ascending
/// departure, or by descending arrival for arrive-by searches.
pub fn compare_itineraries(a: &Itinerary, b: &Itinerary, arrive_by: bool) -> Ordering {
    b.is_walking_only()
        .cmp(&a.is_walking_only())
        .then_with(|| {
            if arrive_by {
                b.arrival().cmp(&a.arrival())
            } else {
                a.departure().cmp(&b.departure())
            }
        })
}

/// Itineraries for the current query plus attribution for the provider
/// that produced them.
#[derive(Debug)]
pub struct Plan {
    itineraries: Vec<Itinerary>,
    bbox: Option<BoundingBox>,
    pub attribution: Option<String>,
    pub attribution_url: Option<String>,
    outcome: Option<PlanSignal>,
    events: broadcast::Sender<PlanEvent>,
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}

impl Plan {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            itineraries: Vec::new(),
            bbox: None,
            attribution: None,
            attribution_url: None,
            outcome: None,
            events,
        }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlanEvent> {
        self.events.subscribe()
    }

    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    /// Union of all itineraries' bounding boxes, if there are any.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// The last signal raised since the plan was reset or updated.
    pub fn outcome(&self) -> Option<PlanSignal> {
        self.outcome
    }

    /// Replaces the itineraries as given.
    pub fn update(&mut self, itineraries: Vec<Itinerary>) {
        self.itineraries = itineraries;
        self.bbox = BoundingBox::union(
            self.itineraries
                .iter()
                .map(Itinerary::bbox)
                .collect::<Vec<_>>()
                .iter(),
        );
        self.outcome = None;
        self.emit(PlanEvent::Updated);
    }

    /// Sorts a batch of new itineraries and either replaces the current
    /// ones with it or appends it after them.
    pub fn update_with_new_itineraries(
        &mut self,
        mut itineraries: Vec<Itinerary>,
        arrive_by: bool,
        extend_previous: bool,
    ) {
        itineraries.sort_by(|a, b| compare_itineraries(a, b, arrive_by));

        let combined = if extend_previous {
            let mut combined = std::mem::take(&mut self.itineraries);
            combined.extend(itineraries);
            combined
        } else {
            itineraries
        };
        self.update(combined);
    }

    /// Publishes the outcome of a search.
    ///
    /// Non-empty results go through [`Plan::update_with_new_itineraries`].
    /// An empty first search clears the plan and signals
    /// [`PlanSignal::NoRouteFound`]; an empty extension signals
    /// [`PlanSignal::NoMoreResults`] and keeps what is there.
    pub fn present_results(
        &mut self,
        itineraries: Vec<Itinerary>,
        arrive_by: bool,
        extend_previous: bool,
    ) {
        if !itineraries.is_empty() {
            self.update_with_new_itineraries(itineraries, arrive_by, extend_previous);
        } else if extend_previous {
            self.no_more_results();
        } else {
            self.reset();
            self.no_route_found();
        }
    }

    /// Clears all itineraries and attribution.
    pub fn reset(&mut self) {
        self.itineraries.clear();
        self.bbox = None;
        self.attribution = None;
        self.attribution_url = None;
        self.outcome = None;
        self.emit(PlanEvent::Reset);
    }

    pub fn no_more_results(&mut self) {
        self.signal(PlanSignal::NoMoreResults);
    }

    pub fn no_route_found(&mut self) {
        self.signal(PlanSignal::NoRouteFound);
    }

    pub fn request_failed(&mut self) {
        self.signal(PlanSignal::RequestFailed);
    }

    pub fn no_provider(&mut self) {
        self.signal(PlanSignal::NoProvider);
    }

    fn signal(&mut self, signal: PlanSignal) {
        self.outcome = Some(signal);
        self.emit(PlanEvent::Signal(signal));
    }

    fn emit(&self, event: PlanEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Leg};
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, h, m, 0)
            .unwrap()
    }

    fn ride(dep: DateTime<FixedOffset>, minutes: i64) -> Itinerary {
        let arr = dep + Duration::minutes(minutes);
        let leg = Leg::transit(
            "1",
            "A",
            Coordinate::new(0.0, 0.0),
            "B",
            Coordinate::new(0.0, 0.05),
            dep,
            arr,
        );
        Itinerary::new(vec![leg], dep, arr).unwrap()
    }

    fn walk(dep: DateTime<FixedOffset>) -> Itinerary {
        let leg = Leg::walk(
            "A",
            Coordinate::new(0.0, 0.0),
            "B",
            Coordinate::new(0.0, 0.005),
            556.0,
            556.0,
        );
        Itinerary::new(vec![leg], dep, dep + Duration::seconds(556)).unwrap()
    }

    #[test]
    fn leave_by_sorts_ascending_departure() {
        let mut plan = Plan::new();
        plan.update_with_new_itineraries(vec![ride(at(10, 30), 10), ride(at(10, 0), 10)], false, false);

        let deps: Vec<_> = plan.itineraries().iter().map(|i| i.departure()).collect();
        assert_eq!(deps, [at(10, 0), at(10, 30)]);
    }

    #[test]
    fn arrive_by_sorts_descending_arrival() {
        let mut plan = Plan::new();
        // arrivals 10:40 and 10:50
        plan.update_with_new_itineraries(vec![ride(at(10, 30), 10), ride(at(10, 0), 50)], true, false);

        let arrs: Vec<_> = plan.itineraries().iter().map(|i| i.arrival()).collect();
        assert_eq!(arrs, [at(10, 50), at(10, 40)]);
    }

    #[test]
    fn walking_only_sorts_first() {
        let mut plan = Plan::new();
        plan.update_with_new_itineraries(vec![ride(at(9, 0), 10), walk(at(11, 0))], false, false);
        assert!(plan.itineraries()[0].is_walking_only());

        plan.update_with_new_itineraries(vec![ride(at(9, 0), 10), walk(at(8, 0))], true, false);
        assert!(plan.itineraries()[0].is_walking_only());
    }

    #[test]
    fn extend_appends_after_existing() {
        let mut plan = Plan::new();
        plan.update_with_new_itineraries(vec![ride(at(10, 0), 10)], false, false);
        plan.update_with_new_itineraries(vec![ride(at(10, 40), 10), ride(at(10, 20), 10)], false, true);

        let deps: Vec<_> = plan.itineraries().iter().map(|i| i.departure()).collect();
        assert_eq!(deps, [at(10, 0), at(10, 20), at(10, 40)]);
        assert!(plan.bbox().is_some());
    }

    #[test]
    fn events_are_broadcast() {
        let mut plan = Plan::new();
        let mut rx = plan.subscribe();

        plan.reset();
        plan.update(vec![ride(at(10, 0), 10)]);
        plan.no_more_results();

        assert_eq!(rx.try_recv().unwrap(), PlanEvent::Reset);
        assert_eq!(rx.try_recv().unwrap(), PlanEvent::Updated);
        assert_eq!(
            rx.try_recv().unwrap(),
            PlanEvent::Signal(PlanSignal::NoMoreResults)
        );
        assert_eq!(plan.outcome(), Some(PlanSignal::NoMoreResults));
    }

    #[test]
    fn empty_results_signal_by_mode() {
        let mut plan = Plan::new();
        plan.present_results(vec![ride(at(10, 0), 10)], false, false);
        plan.present_results(Vec::new(), false, true);
        assert_eq!(plan.outcome(), Some(PlanSignal::NoMoreResults));
        assert_eq!(plan.itineraries().len(), 1);

        plan.present_results(Vec::new(), false, false);
        assert_eq!(plan.outcome(), Some(PlanSignal::NoRouteFound));
        assert!(plan.itineraries().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut plan = Plan::new();
        plan.attribution = Some("SL".into());
        plan.update(vec![ride(at(10, 0), 10)]);
        plan.no_route_found();
        plan.reset();

        assert!(plan.itineraries().is_empty());
        assert!(plan.bbox().is_none());
        assert!(plan.attribution.is_none());
        assert_eq!(plan.outcome(), None);
    }
}
