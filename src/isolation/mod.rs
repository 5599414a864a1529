//! Isolation rules and the engines that apply them.
//!
//! A rule set ([`IsolationProperties`]) maps conditions on the whole population (the proportion
//! infected) or on one case (its virus or alert status) to an [`IsolationProperty`]: how likely
//! a matching case is to isolate and for how long. [`SingleCaseIsolationPolicy`] resolves the
//! governing rule for one case and remembers the outcome; [`ContactIsolationPolicy`] combines two
//! such decisions into a verdict on a contact.

mod contact;
mod single_case;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::hashing::HashSet;
use crate::random::Distribution;
use crate::status::{AlertStatus, VirusStatus};

pub use contact::ContactIsolationPolicy;
pub use single_case::{IsolationMemory, SingleCaseIsolationPolicy};

/// When an isolation window opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationStartTimeType {
    /// At the time the rule is first applied.
    #[default]
    Absolute,
    /// At the time the case was exposed.
    ContactTime,
}

/// A named isolation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationProperty {
    pub id: String,
    /// Chance of isolating, in percent.
    pub isolation_probability_distribution: Distribution,
    /// Length of the isolation window in days. Rules without one isolate indefinitely.
    #[serde(default)]
    pub isolation_time_distribution: Option<Distribution>,
    pub priority: i32,
    #[serde(default)]
    pub override_compliance_and_force_policy: bool,
    #[serde(default)]
    pub start_of_isolation_time: IsolationStartTimeType,
}

impl IsolationProperty {
    /// Whether two rules always lead to the same decision distribution.
    #[must_use]
    pub fn same_outcome(&self, other: &IsolationProperty) -> bool {
        self.isolation_probability_distribution == other.isolation_probability_distribution
            && self.isolation_time_distribution == other.isolation_time_distribution
    }

    fn validate(&self) -> Result<(), SimError> {
        self.isolation_probability_distribution
            .validate(&format!("{}.isolation_probability_distribution", self.id))?;
        if let Some(time) = &self.isolation_time_distribution {
            time.validate(&format!("{}.isolation_time_distribution", self.id))?;
        }
        Ok(())
    }
}

/// An inclusive range of the population-wide proportion infected, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionRange {
    pub min: f64,
    pub max: f64,
}

impl ProportionRange {
    #[must_use]
    pub fn contains(&self, percent: f64) -> bool {
        self.min <= percent && percent <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionInfectedIsolationPolicy {
    pub proportion_infected: ProportionRange,
    pub isolation_property: IsolationProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirusStatusIsolationPolicy {
    pub virus_status: VirusStatus,
    pub isolation_property: IsolationProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStatusIsolationPolicy {
    pub alert_status: AlertStatus,
    pub isolation_property: IsolationProperty,
}

/// The full isolation rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationProperties {
    #[serde(default)]
    pub global_isolation_policies: Vec<ProportionInfectedIsolationPolicy>,
    #[serde(default)]
    pub virus_status_policies: Vec<VirusStatusIsolationPolicy>,
    #[serde(default)]
    pub alert_status_policies: Vec<AlertStatusIsolationPolicy>,
    /// Always matches.
    pub default_policy: IsolationProperty,
    /// Drawn once per fresh decision and compared against the rule's probability.
    pub isolation_probability_distribution_threshold: Distribution,
}

impl IsolationProperties {
    /// Every rule, in resolution order: global, virus status, alert status, default.
    pub fn properties(&self) -> impl Iterator<Item = &IsolationProperty> {
        self.global_isolation_policies
            .iter()
            .map(|policy| &policy.isolation_property)
            .chain(
                self.virus_status_policies
                    .iter()
                    .map(|policy| &policy.isolation_property),
            )
            .chain(
                self.alert_status_policies
                    .iter()
                    .map(|policy| &policy.isolation_property),
            )
            .chain(std::iter::once(&self.default_policy))
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for duplicate rule ids or invalid
    /// distributions.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut seen = HashSet::default();
        for property in self.properties() {
            if !seen.insert(property.id.as_str()) {
                return Err(SimError::InvalidConfiguration(format!(
                    "isolation rule id `{}` is used more than once",
                    property.id
                )));
            }
            property.validate()?;
        }
        self.isolation_probability_distribution_threshold
            .validate("isolation_probability_distribution_threshold")
    }
}
