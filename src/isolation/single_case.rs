use log::trace;

use crate::case::{Case, CaseId};
use crate::error::SimError;
use crate::event::Time;
use crate::hashing::HashMap;
use crate::isolation::{IsolationProperties, IsolationProperty, IsolationStartTimeType};
use crate::random::DistributionSampler;

/// The last fresh isolation decision made for a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationMemory {
    /// Id of the rule that governed the decision.
    pub property_id: String,
    pub start_time: Time,
    /// Length of the window in steps; `None` for rules without a duration.
    pub max_isolation_time: Option<Time>,
    pub isolating: bool,
}

impl IsolationMemory {
    fn window_open(&self, time: Time) -> bool {
        self.max_isolation_time
            .is_none_or(|max| self.start_time <= time && time - self.start_time < max)
    }
}

/// Decides whether a single case is isolating at a given time.
///
/// A decision is sticky: while the same rule keeps governing a case, the sampled outcome is
/// reused until its window closes instead of being redrawn every step.
#[derive(Debug, Clone)]
pub struct SingleCaseIsolationPolicy {
    properties: IsolationProperties,
    steps_per_day: i64,
    memory: HashMap<CaseId, IsolationMemory>,
}

impl SingleCaseIsolationPolicy {
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` if the rule set is invalid.
    pub fn new(
        properties: IsolationProperties,
        steps_per_day: i64,
    ) -> Result<SingleCaseIsolationPolicy, SimError> {
        properties.validate()?;
        Ok(SingleCaseIsolationPolicy {
            properties,
            steps_per_day,
            memory: HashMap::default(),
        })
    }

    #[must_use]
    pub fn memory(&self, id: CaseId) -> Option<&IsolationMemory> {
        self.memory.get(&id)
    }

    /// Finds the rule governing `case` when `proportion_infected` of the population is
    /// infectious.
    ///
    /// Every matching rule is collected and the highest priority wins. Ties are only allowed
    /// between rules with the same outcome, in which case the first in resolution order is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NonDeterministicPolicy` if tied rules disagree.
    pub fn resolve_property(
        &self,
        case: &Case,
        proportion_infected: f64,
    ) -> Result<&IsolationProperty, SimError> {
        let percent = proportion_infected * 100.0;
        let properties = &self.properties;
        let matches: Vec<&IsolationProperty> = properties
            .global_isolation_policies
            .iter()
            .filter(|policy| policy.proportion_infected.contains(percent))
            .map(|policy| &policy.isolation_property)
            .chain(
                properties
                    .virus_status_policies
                    .iter()
                    .filter(|policy| policy.virus_status == case.virus_status())
                    .map(|policy| &policy.isolation_property),
            )
            .chain(
                properties
                    .alert_status_policies
                    .iter()
                    .filter(|policy| policy.alert_status == case.alert_status())
                    .map(|policy| &policy.isolation_property),
            )
            .chain(std::iter::once(&properties.default_policy))
            .collect();

        let top_priority = matches
            .iter()
            .map(|property| property.priority)
            .max()
            .unwrap_or(properties.default_policy.priority);
        let top: Vec<&IsolationProperty> = matches
            .into_iter()
            .filter(|property| property.priority == top_priority)
            .collect();

        let Some(&first) = top.first() else {
            return Ok(&properties.default_policy);
        };
        if top.iter().any(|property| !property.same_outcome(first)) {
            return Err(SimError::NonDeterministicPolicy(
                top.iter().map(|property| property.id.clone()).collect(),
            ));
        }
        Ok(first)
    }

    /// Whether `case` is isolating at `time`.
    ///
    /// A fresh decision draws, in order: the window length (timed rules only), the global
    /// threshold, the rule's probability and a compliance uniform (skipped for rules that
    /// override compliance). The case isolates iff the threshold is below the probability, it
    /// complies, and `time` falls inside the window.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NonDeterministicPolicy` if the rule set is ambiguous for this case.
    pub fn is_individual_in_isolation(
        &mut self,
        case: &Case,
        proportion_infected: f64,
        time: Time,
        sampler: &mut dyn DistributionSampler,
    ) -> Result<bool, SimError> {
        let property = self.resolve_property(case, proportion_infected)?.clone();

        if let Some(memory) = self.memory.get(&case.id) {
            if memory.property_id == property.id {
                let isolating = memory.isolating && memory.window_open(time);
                trace!(
                    "case {} remains under rule {} at {time}: isolating={isolating}",
                    case.id,
                    property.id
                );
                return Ok(isolating);
            }
        }

        let start_time = match property.start_of_isolation_time {
            IsolationStartTimeType::Absolute => time,
            IsolationStartTimeType::ContactTime => case.exposed_time().unwrap_or(time),
        };
        let max_isolation_time = property
            .isolation_time_distribution
            .as_ref()
            .map(|duration| sampler.get_distribution_value(duration) * self.steps_per_day);
        let threshold = sampler
            .get_distribution_value(&self.properties.isolation_probability_distribution_threshold);
        let probability =
            sampler.get_distribution_value(&property.isolation_probability_distribution);
        let compliant = property.override_compliance_and_force_policy
            || sampler.uniform_between_zero_and_one() < case.isolation_compliance;

        let memory = IsolationMemory {
            property_id: property.id.clone(),
            start_time,
            max_isolation_time,
            isolating: threshold < probability && compliant,
        };
        let isolating = memory.isolating && memory.window_open(time);
        trace!(
            "case {} falls under rule {} at {time}: isolating={isolating}",
            case.id,
            property.id
        );

        let is_default = property.id == self.properties.default_policy.id;
        if max_isolation_time.is_some() || is_default {
            self.memory.insert(case.id, memory);
        } else if !isolating {
            self.memory.remove(&case.id);
        }
        Ok(isolating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ExposedBy, Gender};
    use crate::isolation::testing::{never_isolate, rule};
    use crate::isolation::{
        AlertStatusIsolationPolicy, ProportionInfectedIsolationPolicy, ProportionRange,
        VirusStatusIsolationPolicy,
    };
    use crate::random::testing::ScriptedSampler;
    use crate::random::RandomSampler;
    use crate::status::{AlertStatus, VirusStatus};

    fn case_with(virus: VirusStatus, alert: AlertStatus, compliance: f64) -> Case {
        let mut case = Case::new(CaseId(0), 0.5, compliance, 1.0, 30, Gender::Female);
        case.virus_status = virus;
        case.alert_status = alert;
        case
    }

    fn symptomatic_rule(properties: &mut IsolationProperties, property: IsolationProperty) {
        properties.virus_status_policies.push(VirusStatusIsolationPolicy {
            virus_status: VirusStatus::Symptomatic,
            isolation_property: property,
        });
    }

    #[test]
    fn default_rule_when_nothing_matches() {
        let policy = SingleCaseIsolationPolicy::new(never_isolate(), 1).unwrap();
        let case = case_with(VirusStatus::Susceptible, AlertStatus::None, 1.0);
        assert_eq!(policy.resolve_property(&case, 0.0).unwrap().id, "default");
    }

    #[test]
    fn highest_priority_wins() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, None, 1));
        properties.alert_status_policies.push(AlertStatusIsolationPolicy {
            alert_status: AlertStatus::TestedPositive,
            isolation_property: rule("positive", 100, Some(10), 5),
        });
        properties
            .global_isolation_policies
            .push(ProportionInfectedIsolationPolicy {
                proportion_infected: ProportionRange {
                    min: 0.0,
                    max: 10.0,
                },
                isolation_property: rule("low_prevalence", 0, None, 3),
            });
        let policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();

        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        assert_eq!(policy.resolve_property(&case, 0.05).unwrap().id, "low_prevalence");
        assert_eq!(policy.resolve_property(&case, 0.5).unwrap().id, "symptomatic");

        let case = case_with(VirusStatus::Symptomatic, AlertStatus::TestedPositive, 1.0);
        assert_eq!(policy.resolve_property(&case, 0.05).unwrap().id, "positive");
    }

    #[test]
    fn tied_rules_must_agree() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, Some(5), 2));
        properties.alert_status_policies.push(AlertStatusIsolationPolicy {
            alert_status: AlertStatus::Alerted,
            isolation_property: rule("alerted", 50, Some(5), 2),
        });
        let policy = SingleCaseIsolationPolicy::new(properties.clone(), 1).unwrap();
        let case = case_with(VirusStatus::Symptomatic, AlertStatus::Alerted, 1.0);
        match policy.resolve_property(&case, 0.0) {
            Err(SimError::NonDeterministicPolicy(ids)) => {
                assert_eq!(ids, vec!["symptomatic".to_string(), "alerted".to_string()]);
            }
            other => panic!("expected a non-deterministic policy error, got {other:?}"),
        }

        properties.alert_status_policies[0].isolation_property = rule("alerted", 100, Some(5), 2);
        let policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();
        assert_eq!(policy.resolve_property(&case, 0.0).unwrap().id, "symptomatic");
    }

    #[test]
    fn decision_sticks_for_the_window() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, Some(3), 1));
        let mut policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();
        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        let mut sampler = RandomSampler::new(3);

        let t = 10;
        for (time, expected) in [(t, true), (t + 1, true), (t + 2, true), (t + 3, false)] {
            assert_eq!(
                policy
                    .is_individual_in_isolation(&case, 0.0, time, &mut sampler)
                    .unwrap(),
                expected,
                "time {time}"
            );
        }
        let memory = policy.memory(case.id).unwrap();
        assert_eq!(memory.start_time, t);
        assert_eq!(memory.max_isolation_time, Some(3));
    }

    #[test]
    fn sticky_evaluation_does_not_draw() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, Some(3), 1));
        let mut policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();
        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        // duration, threshold, probability
        let mut sampler = ScriptedSampler::fixed(0, 0.0).with_values(&[3, 20, 100]);

        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 0, &mut sampler)
            .unwrap());
        assert_eq!(sampler.value_draws, 3);
        assert_eq!(sampler.uniform_draws, 1);

        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 1, &mut sampler)
            .unwrap());
        assert_eq!(sampler.value_draws, 3);
        assert_eq!(sampler.uniform_draws, 1);
    }

    #[test]
    fn steps_per_day_scales_the_window() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, Some(2), 1));
        let mut policy = SingleCaseIsolationPolicy::new(properties, 4).unwrap();
        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        let mut sampler = ScriptedSampler::fixed(0, 0.0).with_values(&[2, 0, 100]);

        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 0, &mut sampler)
            .unwrap());
        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 7, &mut sampler)
            .unwrap());
        assert!(!policy
            .is_individual_in_isolation(&case, 0.0, 8, &mut sampler)
            .unwrap());
    }

    #[test]
    fn non_compliant_cases_do_not_isolate_unless_forced() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, None, 1));
        let mut policy = SingleCaseIsolationPolicy::new(properties.clone(), 1).unwrap();
        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 0.0);
        // threshold, probability
        let mut sampler = ScriptedSampler::fixed(0, 0.5).with_values(&[0, 100]);
        assert!(!policy
            .is_individual_in_isolation(&case, 0.0, 0, &mut sampler)
            .unwrap());
        // Untimed, non-default rules that do not isolate leave no memory.
        assert!(policy.memory(case.id).is_none());

        properties.virus_status_policies[0]
            .isolation_property
            .override_compliance_and_force_policy = true;
        let mut policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();
        let mut sampler = ScriptedSampler::fixed(0, 0.5).with_values(&[0, 100]);
        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 0, &mut sampler)
            .unwrap());
        assert_eq!(sampler.uniform_draws, 0);
    }

    #[test]
    fn contact_time_start_can_leave_the_window_closed() {
        let mut properties = never_isolate();
        let mut property = rule("symptomatic", 100, Some(5), 1);
        property.start_of_isolation_time = IsolationStartTimeType::ContactTime;
        symptomatic_rule(&mut properties, property);
        let mut policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();

        let mut case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        case.exposed_by = Some(ExposedBy::Random);
        case.exposed_time = Some(2);
        let mut sampler = ScriptedSampler::fixed(0, 0.0).with_values(&[5, 0, 100]);

        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 6, &mut sampler)
            .unwrap());
        assert!(!policy
            .is_individual_in_isolation(&case, 0.0, 7, &mut sampler)
            .unwrap());
        assert_eq!(policy.memory(case.id).unwrap().start_time, 2);
    }

    #[test]
    fn rule_change_forces_a_fresh_decision() {
        let mut properties = never_isolate();
        symptomatic_rule(&mut properties, rule("symptomatic", 100, Some(10), 1));
        let mut policy = SingleCaseIsolationPolicy::new(properties, 1).unwrap();
        let mut sampler = ScriptedSampler::fixed(0, 0.0).with_values(&[10, 0, 100]);

        let case = case_with(VirusStatus::Symptomatic, AlertStatus::None, 1.0);
        assert!(policy
            .is_individual_in_isolation(&case, 0.0, 0, &mut sampler)
            .unwrap());

        // Recovery hands the case back to the default rule, which never isolates.
        let case = case_with(VirusStatus::Recovered, AlertStatus::None, 1.0);
        assert!(!policy
            .is_individual_in_isolation(&case, 0.0, 1, &mut sampler)
            .unwrap());
        assert_eq!(policy.memory(case.id).unwrap().property_id, "default");
    }
}
