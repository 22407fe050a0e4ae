use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveTime;

use crate::timetable::document::{TimingLink, VehicleJourney};
use crate::timetable::duration_ops::add_time;

/// a journey's projected visit times, aligned with its pattern's stop
/// positions (the first link's origin, then every link's destination).
/// `None` marks a visit suppressed by a dead run; the clock still advanced
/// through it.
#[derive(Debug)]
pub(crate) struct ProjectedJourney {
    pub codes: Vec<String>,
    pub times: Vec<Option<NaiveTime>>,
}

/// walks the journey's timing links accumulating wait and run durations
/// from its departure time. a stop's displayed time includes any dwell
/// there, so a destination's wait time lands before the stop is emitted.
pub(crate) fn project(journey: &VehicleJourney, links: &[&TimingLink]) -> ProjectedJourney {
    let mut codes = Vec::with_capacity(links.len() + 1);
    let mut times = Vec::with_capacity(links.len() + 1);
    let Some(first) = links.first() else {
        return ProjectedJourney { codes, times };
    };

    let mut deadrun = journey.start_deadrun.is_some();
    let mut time = journey.departure_time;
    codes.push(first.from.stop_ref.clone());
    times.push(if deadrun { None } else { Some(time) });

    for link in links {
        if let Some(wait) = link.from.wait_time {
            time = add_time(time, wait);
        }
        time = add_time(time, link.run_time);
        if let Some(wait) = link.to.wait_time {
            time = add_time(time, wait);
        }
        codes.push(link.to.stop_ref.clone());

        if deadrun {
            times.push(None);
            // the dead run ends with this link; passengers board after it
            if link.id.is_some() && link.id == journey.start_deadrun {
                deadrun = false;
            }
        } else if link.id.is_some() && link.id == journey.end_deadrun {
            times.push(None);
            deadrun = true;
        } else {
            times.push(Some(time));
        }
    }

    ProjectedJourney { codes, times }
}

/// precomputed ordering data for one journey column. built once per sort
/// so the shared-stop comparator does not rescan timing links on every
/// comparison; the sort itself remains worst-case O(n²) in the number of
/// journeys.
#[derive(Debug)]
pub(crate) struct JourneySortKey {
    pub sequence: Option<u32>,
    pub departure: NaiveTime,
    pub first_code: Option<String>,
    pub path: Vec<(String, NaiveTime)>,
    pub lookup: HashMap<String, NaiveTime>,
}

impl JourneySortKey {
    pub fn new(journey: &VehicleJourney, projected: &ProjectedJourney) -> JourneySortKey {
        let path: Vec<(String, NaiveTime)> = projected
            .codes
            .iter()
            .zip(projected.times.iter())
            .filter_map(|(code, time)| time.map(|t| (code.clone(), t)))
            .collect();
        let mut lookup = HashMap::new();
        for (code, time) in &path {
            lookup.entry(code.clone()).or_insert(*time);
        }
        JourneySortKey {
            sequence: journey.sequence_number,
            departure: journey.departure_time,
            first_code: projected.codes.first().cloned(),
            path,
            lookup,
        }
    }
}

/// column order within a grouping: explicit sequence numbers when both
/// journeys carry one, otherwise departure time - except that journeys
/// whose patterns start at different stops are aligned on the first stop
/// they share and compared there instead.
pub(crate) fn compare_journeys(a: &JourneySortKey, b: &JourneySortKey) -> Ordering {
    if let (Some(x), Some(y)) = (a.sequence, b.sequence) {
        return x.cmp(&y);
    }
    if a.first_code == b.first_code {
        return a.departure.cmp(&b.departure);
    }
    for (code, time) in &a.path {
        if let Some(other) = b.lookup.get(code) {
            return time.cmp(other);
        }
    }
    a.departure.cmp(&b.departure)
}

#[cfg(test)]
mod test {
    use super::{compare_journeys, project, JourneySortKey};
    use crate::timetable::document::{Stop, StopUsage, TimingLink, TimingStatus, VehicleJourney};
    use chrono::{Duration, NaiveTime};
    use std::cmp::Ordering;
    use std::collections::BTreeMap;

    fn usage(code: &str, wait_minutes: Option<i64>) -> StopUsage {
        StopUsage {
            stop_ref: code.to_string(),
            sequence_number: None,
            timing_status: TimingStatus::Principal,
            wait_time: wait_minutes.map(Duration::minutes),
        }
    }

    fn link(id: &str, from: &str, to: &str, run_minutes: i64, to_wait: Option<i64>) -> TimingLink {
        TimingLink {
            id: Some(id.to_string()),
            from: usage(from, None),
            to: usage(to, to_wait),
            run_time: Duration::minutes(run_minutes),
        }
    }

    fn journey(departure: NaiveTime) -> VehicleJourney {
        VehicleJourney {
            code: None,
            sequence_number: None,
            pattern_ref: "JP1".to_string(),
            departure_time: departure,
            operating_profile: None,
            start_deadrun: None,
            end_deadrun: None,
            notes: BTreeMap::new(),
        }
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_wait_and_run_times_accumulate() {
        let links = vec![
            link("TL1", "S1", "S2", 5, Some(2)),
            link("TL2", "S2", "S3", 10, None),
        ];
        let refs: Vec<&TimingLink> = links.iter().collect();
        let projected = project(&journey(time(8, 0)), &refs);

        assert_eq!(projected.codes, vec!["S1", "S2", "S3"]);
        assert_eq!(
            projected.times,
            vec![Some(time(8, 0)), Some(time(8, 7)), Some(time(8, 17))]
        );
    }

    #[test]
    fn test_dead_run_suppresses_stops_but_clock_advances() {
        let links = vec![
            link("TL1", "S1", "S2", 5, None),
            link("TL2", "S2", "S3", 10, None),
            link("TL3", "S3", "S4", 3, None),
        ];
        let refs: Vec<&TimingLink> = links.iter().collect();
        let mut vj = journey(time(8, 0));
        vj.start_deadrun = Some("TL1".to_string());
        let projected = project(&vj, &refs);

        // neither end of the dead-run link is a public stop
        assert_eq!(projected.times[0], None);
        assert_eq!(projected.times[1], None);
        // the elapsed dead-run minutes are still on the clock
        assert_eq!(projected.times[2], Some(time(8, 15)));
        assert_eq!(projected.times[3], Some(time(8, 18)));
    }

    #[test]
    fn test_end_dead_run_cuts_the_tail() {
        let links = vec![
            link("TL1", "S1", "S2", 5, None),
            link("TL2", "S2", "S3", 10, None),
            link("TL3", "S3", "S4", 3, None),
        ];
        let refs: Vec<&TimingLink> = links.iter().collect();
        let mut vj = journey(time(8, 0));
        vj.end_deadrun = Some("TL2".to_string());
        let projected = project(&vj, &refs);

        assert_eq!(projected.times[0], Some(time(8, 0)));
        assert_eq!(projected.times[1], Some(time(8, 5)));
        assert_eq!(projected.times[2], None);
        assert_eq!(projected.times[3], None);
    }

    #[test]
    fn test_departure_time_orders_same_start() {
        let links = vec![link("TL1", "S1", "S2", 5, None)];
        let refs: Vec<&TimingLink> = links.iter().collect();
        let early = journey(time(8, 0));
        let late = journey(time(9, 0));
        let key_early = JourneySortKey::new(&early, &project(&early, &refs));
        let key_late = JourneySortKey::new(&late, &project(&late, &refs));
        assert_eq!(compare_journeys(&key_early, &key_late), Ordering::Less);
    }

    #[test]
    fn test_different_starts_align_on_shared_stop() {
        // one journey starts at S0 and reaches the shared stop S1 late;
        // the other starts at S1 earlier than the first arrives there
        let long_links = vec![
            link("TL0", "S0", "S1", 30, None),
            link("TL1", "S1", "S2", 5, None),
        ];
        let short_links = vec![link("TL1", "S1", "S2", 5, None)];
        let long_refs: Vec<&TimingLink> = long_links.iter().collect();
        let short_refs: Vec<&TimingLink> = short_links.iter().collect();

        let from_depot = journey(time(8, 0));
        let from_town = journey(time(8, 10));
        let key_depot = JourneySortKey::new(&from_depot, &project(&from_depot, &long_refs));
        let key_town = JourneySortKey::new(&from_town, &project(&from_town, &short_refs));

        // at S1 the first journey reads 08:30, the second 08:10; raw
        // departure times would have ordered them the other way round
        assert_eq!(compare_journeys(&key_town, &key_depot), Ordering::Less);
        assert_eq!(compare_journeys(&key_depot, &key_town), Ordering::Greater);
    }

    #[test]
    fn test_explicit_sequence_numbers_win() {
        let links = vec![link("TL1", "S1", "S2", 5, None)];
        let refs: Vec<&TimingLink> = links.iter().collect();
        let mut first = journey(time(9, 0));
        first.sequence_number = Some(1);
        let mut second = journey(time(8, 0));
        second.sequence_number = Some(2);
        let key_first = JourneySortKey::new(&first, &project(&first, &refs));
        let key_second = JourneySortKey::new(&second, &project(&second, &refs));
        assert_eq!(compare_journeys(&key_first, &key_second), Ordering::Less);
    }
}
