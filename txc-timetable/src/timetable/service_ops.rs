use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

use chrono::NaiveDate;

use crate::timetable::document::StopLookup;
use crate::timetable::timetable::{build_timetable, Timetable};
use crate::timetable::timetable_error::TimetableError;

/// where the source documents for a service live. archive layout is the
/// collaborator's concern; the compiler only asks for byte streams.
pub trait DocumentStore {
    fn documents_for_service(
        &self,
        service_id: &str,
    ) -> Result<Vec<Box<dyn Read>>, TimetableError>;
}

/// document store over a zip archive whose XML member names carry the
/// service identifier.
pub struct ZipDocumentStore {
    path: PathBuf,
}

impl ZipDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> ZipDocumentStore {
        ZipDocumentStore { path: path.into() }
    }
}

impl DocumentStore for ZipDocumentStore {
    fn documents_for_service(
        &self,
        service_id: &str,
    ) -> Result<Vec<Box<dyn Read>>, TimetableError> {
        let file = std::fs::File::open(&self.path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let names: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(".xml") && name.contains(service_id))
            .map(String::from)
            .collect();

        let mut documents: Vec<Box<dyn Read>> = Vec::with_capacity(names.len());
        for name in names {
            let mut member = archive.by_name(&name)?;
            let mut buffer = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut buffer)?;
            documents.push(Box::new(Cursor::new(buffer)));
        }
        Ok(documents)
    }
}

/// string-keyed cache with per-entry TTL and last-writer-wins semantics.
/// implementations must tolerate concurrent get/set.
pub trait TimetableCache {
    fn get(&self, key: &str) -> Option<Arc<Vec<Timetable>>>;
    fn set(&self, key: &str, value: Arc<Vec<Timetable>>, ttl: StdDuration);
}

/// cache that never stores anything, for one-shot callers.
pub struct NoTimetableCache;

impl TimetableCache for NoTimetableCache {
    fn get(&self, _key: &str) -> Option<Arc<Vec<Timetable>>> {
        None
    }

    fn set(&self, _key: &str, _value: Arc<Vec<Timetable>>, _ttl: StdDuration) {}
}

/// process-local cache. expired entries are dropped on read; a poisoned
/// lock degrades to cache misses rather than failing the request.
#[derive(Default)]
pub struct InMemoryTimetableCache {
    entries: Mutex<HashMap<String, (Instant, Arc<Vec<Timetable>>)>>,
}

impl InMemoryTimetableCache {
    pub fn new() -> InMemoryTimetableCache {
        InMemoryTimetableCache::default()
    }
}

impl TimetableCache for InMemoryTimetableCache {
    fn get(&self, key: &str) -> Option<Arc<Vec<Timetable>>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((deadline, value)) if Instant::now() < *deadline => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: Arc<Vec<Timetable>>, ttl: StdDuration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (Instant::now() + ttl, value));
        }
    }
}

/// the cached multi-document entry point: compiles every candidate
/// document for the service, keeps the ones that apply on `date`, and
/// prefers candidates that actually have journeys so an empty result
/// really means "no buses scheduled".
pub fn timetables_for_service(
    store: &dyn DocumentStore,
    cache: &dyn TimetableCache,
    stop_lookup: &dyn StopLookup,
    service_id: &str,
    date: NaiveDate,
) -> Result<Arc<Vec<Timetable>>, TimetableError> {
    let key = format!("timetable:{service_id}:{date}");
    if let Some(cached) = cache.get(&key) {
        return Ok(cached);
    }

    let mut candidates = Vec::new();
    for document in store.documents_for_service(service_id)? {
        match build_timetable(document, date, None, stop_lookup) {
            Ok(timetable) => candidates.push(timetable),
            Err(TimetableError::NoApplicablePeriod(_)) => {
                log::debug!("document for service '{service_id}' does not apply on {date}");
            }
            Err(TimetableError::NotBusTimetable(mode)) => {
                log::debug!("skipping non-bus document (mode '{mode}') for service '{service_id}'");
            }
            Err(e) => {
                // a structurally broken document must not hide its siblings
                log::warn!("skipping unusable document for service '{service_id}': {e}");
            }
        }
    }

    let chosen = if candidates.len() > 1 && candidates.iter().any(Timetable::has_journeys) {
        candidates
            .into_iter()
            .filter(Timetable::has_journeys)
            .collect()
    } else {
        candidates
    };

    let result = Arc::new(chosen);
    cache.set(&key, result.clone(), ttl_until_following_midnight(date));
    Ok(result)
}

/// schedules are date-scoped, so entries stay valid until the local
/// midnight after the requested date.
fn ttl_until_following_midnight(date: NaiveDate) -> StdDuration {
    let now = chrono::Local::now().naive_local();
    date.succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .and_then(|midnight| (midnight - now).to_std().ok())
        .unwrap_or(StdDuration::from_secs(60))
}

#[cfg(test)]
mod test {
    use super::{
        timetables_for_service, DocumentStore, InMemoryTimetableCache, NoTimetableCache,
        TimetableCache,
    };
    use crate::timetable::document::NoStopLookup;
    use crate::timetable::timetable_error::TimetableError;
    use chrono::NaiveDate;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    fn document(mode: &str, start: &str, end: &str) -> String {
        format!(
            r#"
<TransXChange>
  <JourneyPatternSections>
    <JourneyPatternSection id="JPS1">
      <JourneyPatternTimingLink id="TL1">
        <From><StopPointRef>S1</StopPointRef></From>
        <To><StopPointRef>S2</StopPointRef></To>
        <RunTime>PT5M</RunTime>
      </JourneyPatternTimingLink>
    </JourneyPatternSection>
  </JourneyPatternSections>
  <Services>
    <Service>
      <ServiceCode>SVC1</ServiceCode>
      <OperatingPeriod>
        <StartDate>{start}</StartDate>
        <EndDate>{end}</EndDate>
      </OperatingPeriod>
      <Mode>{mode}</Mode>
      <StandardService>
        <JourneyPattern id="JP1">
          <Direction>outbound</Direction>
          <JourneyPatternSectionRefs>JPS1</JourneyPatternSectionRefs>
        </JourneyPattern>
      </StandardService>
    </Service>
  </Services>
  <VehicleJourneys>
    <VehicleJourney>
      <OperatingProfile>
        <RegularDayType>
          <DaysOfWeek><MondayToSunday/></DaysOfWeek>
        </RegularDayType>
      </OperatingProfile>
      <VehicleJourneyCode>VJ1</VehicleJourneyCode>
      <ServiceRef>SVC1</ServiceRef>
      <JourneyPatternRef>JP1</JourneyPatternRef>
      <DepartureTime>09:00:00</DepartureTime>
    </VehicleJourney>
  </VehicleJourneys>
</TransXChange>
"#
        )
    }

    struct StaticStore {
        documents: Vec<String>,
        requests: AtomicUsize,
    }

    impl StaticStore {
        fn new(documents: Vec<String>) -> StaticStore {
            StaticStore {
                documents,
                requests: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentStore for StaticStore {
        fn documents_for_service(
            &self,
            _service_id: &str,
        ) -> Result<Vec<Box<dyn Read>>, TimetableError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .documents
                .iter()
                .map(|text| Box::new(Cursor::new(text.clone().into_bytes())) as Box<dyn Read>)
                .collect())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_non_applicable_documents_are_discarded() {
        let store = StaticStore::new(vec![
            document("bus", "2024-01-01", "2024-12-31"),
            // expired period
            document("bus", "2020-01-01", "2020-12-31"),
            // wrong mode
            document("rail", "2024-01-01", "2024-12-31"),
        ]);
        let timetables = timetables_for_service(
            &store,
            &NoTimetableCache,
            &NoStopLookup,
            "SVC1",
            date(2024, 6, 5),
        )
        .unwrap();
        assert_eq!(timetables.len(), 1);
        assert!(timetables[0].has_journeys());
    }

    #[test]
    fn test_cache_short_circuits_the_store() {
        let store = StaticStore::new(vec![document("bus", "2024-01-01", "2024-12-31")]);
        let cache = InMemoryTimetableCache::new();
        let day = date(2024, 6, 5);

        let first =
            timetables_for_service(&store, &cache, &NoStopLookup, "SVC1", day).unwrap();
        let second =
            timetables_for_service(&store, &cache, &NoStopLookup, "SVC1", day).unwrap();

        assert_eq!(store.requests.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_cache_entries_are_dropped() {
        let cache = InMemoryTimetableCache::new();
        cache.set("key", Arc::new(Vec::new()), StdDuration::from_secs(0));
        assert!(cache.get("key").is_none());
    }

    #[test]
    fn test_cache_last_writer_wins() {
        let store = StaticStore::new(vec![document("bus", "2024-01-01", "2024-12-31")]);
        let cache = InMemoryTimetableCache::new();
        let day = date(2024, 6, 5);
        let built =
            timetables_for_service(&store, &NoTimetableCache, &NoStopLookup, "SVC1", day)
                .unwrap();

        cache.set("key", Arc::new(Vec::new()), StdDuration::from_secs(300));
        cache.set("key", built.clone(), StdDuration::from_secs(300));
        let got = cache.get("key").unwrap();
        assert!(Arc::ptr_eq(&got, &built));
    }
}
