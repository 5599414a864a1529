use std::path::Path;

use contact_tracing_sim::input::load_properties;
use contact_tracing_sim::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const POPULATION: u32 = 100;
const DAYS: i64 = 200;

fn population() -> Population {
    let cases = (0..POPULATION)
        .map(|id| {
            let health = f64::from(id % 10) / 10.0;
            Case::new(CaseId(id), health, 0.8, 0.7, 20 + id % 60, Gender::Other)
        })
        .collect();
    Population::new(cases).unwrap()
}

fn contacts() -> Vec<ContactEvent> {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut contacts = Vec::new();
    for time in 0..DAYS {
        for _ in 0..40 {
            let from = rng.random_range(0..POPULATION);
            let to = rng.random_range(0..POPULATION);
            if from != to {
                contacts.push(ContactEvent {
                    time,
                    from: CaseId(from),
                    to: CaseId(to),
                    weight: rng.random_range(0.5..12.0),
                });
            }
        }
    }
    contacts
}

fn context(seed: u64) -> Context {
    let mut properties = load_properties(Path::new("tests/data/properties.json")).unwrap();
    properties.standard.population_size = POPULATION as usize;
    properties.standard.time_limit_days = DAYS;
    properties.standard.steady_state = true;
    properties.disease.random_infection_rate = 0.0;

    let mut context =
        Context::new(properties, population(), Box::new(RandomSampler::new(seed))).unwrap();
    context.add_contacts(contacts()).unwrap();
    context
}

fn seeds() -> Vec<CaseId> {
    (0..10).map(|id| CaseId(id * 10)).collect()
}

#[test]
fn outbreak_burns_out_before_the_horizon() {
    let mut context = context(42);
    let summary = EventRunner::new(seeds()).run(&mut context).unwrap();

    let last_time = summary.last_time.unwrap();
    // Contacts continue to the last day, so only the steady state can end the run early.
    assert_eq!(
        context.event_store().last_time::<ContactEvent>(),
        Some(DAYS - 1)
    );
    assert!(summary.stopped_early);
    assert!(last_time < context.standard().horizon());
    assert_eq!(context.population().active_cases(), 0);

    let mut previous = usize::MAX;
    for day in 0..=last_time {
        let record = context.statistics().day(day).unwrap();
        assert!(record.s <= previous, "susceptibles grew on day {day}");
        assert_eq!(record.total(), POPULATION as usize);
        previous = record.s;
    }
    assert!(previous < POPULATION as usize);
}

#[test]
fn every_infection_is_recorded_once() {
    let mut context = context(7);
    EventRunner::new(seeds()).run(&mut context).unwrap();

    let infections = context.statistics().infections();
    let infected = context
        .population()
        .iter()
        .filter(|case| case.virus_status() != VirusStatus::Susceptible)
        .count();
    assert_eq!(infections.len(), infected);
    for record in infections {
        let case = context.population().get(record.infectee).unwrap();
        assert_eq!(case.exposed_by(), Some(record.infector));
        assert!(case.exposed_time().is_some_and(|time| time <= record.time));
        if let ExposedBy::Case(infector) = record.infector {
            assert_ne!(infector, record.infectee);
        }
    }
}

#[test]
fn runs_are_reproducible_from_the_seed() {
    let mut first = context(3);
    let mut second = context(3);
    let first_summary = EventRunner::new(seeds()).run(&mut first).unwrap();
    let second_summary = EventRunner::new(seeds()).run(&mut second).unwrap();

    assert_eq!(first_summary, second_summary);
    assert_eq!(
        first.statistics().infections(),
        second.statistics().infections()
    );
    assert_eq!(
        first.population().status_histogram(),
        second.population().status_histogram()
    );
}
