//! Run, disease and tracing parameters, read from the `standard`, `disease` and
//! `contact_tracing` sections of the properties file.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::event::Time;
use crate::isolation::IsolationProperties;
use crate::random::{Distribution, DistributionType};
use crate::status::{AlertStatus, VirusStatus};

fn check_probability(name: &str, value: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidConfiguration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfiguration(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardProperties {
    pub population_size: usize,
    pub time_limit_days: i64,
    pub steps_per_day: i64,
    /// Stop as soon as no case can change state any more.
    #[serde(default)]
    pub steady_state: bool,
}

impl StandardProperties {
    /// The last time step the run may process.
    #[must_use]
    pub fn horizon(&self) -> Time {
        self.time_limit_days * self.steps_per_day
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for a zero step rate or negative time limit.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.steps_per_day <= 0 {
            return Err(SimError::InvalidConfiguration(
                "steps_per_day must be at least 1".to_string(),
            ));
        }
        if self.time_limit_days < 0 {
            return Err(SimError::InvalidConfiguration(
                "time_limit_days must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A progression time in days; the family comes from
/// [`DiseaseProperties::progression_distribution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionTime {
    pub mean: f64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseProperties {
    pub progression_distribution: DistributionType,
    pub time_latent: ProgressionTime,
    pub time_recovery_asymp: ProgressionTime,
    pub time_recovery_symp: ProgressionTime,
    pub time_recovery_sev: ProgressionTime,
    pub time_symptoms_onset: ProgressionTime,
    pub time_decline: ProgressionTime,
    pub time_death: ProgressionTime,
    pub time_test_administered: Distribution,
    pub time_test_result: Distribution,
    pub exposure_probability_4_unit_contact: f64,
    pub exposure_exponent: f64,
    /// Contacts at or above this weight transmit even when a party is isolating.
    pub exposure_threshold: f64,
    /// Expected random infections per susceptible case per day.
    #[serde(default)]
    pub random_infection_rate: f64,
    /// Probability an infectious case tests positive. Unset means a perfect test.
    #[serde(default)]
    pub test_positive_accuracy: Option<f64>,
    /// Probability a non-infectious case tests negative. Unset means a perfect test.
    #[serde(default)]
    pub test_negative_accuracy: Option<f64>,
}

impl DiseaseProperties {
    fn progression(&self, time: ProgressionTime) -> Distribution {
        Distribution {
            distribution_type: self.progression_distribution,
            mean: time.mean,
            max: time.max,
        }
    }

    /// The distribution governing how long a case stays in `current` before moving to `next`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnreachableTransition` for a pair the virus graph never produces.
    pub fn progression_time(
        &self,
        current: VirusStatus,
        next: VirusStatus,
    ) -> Result<Distribution, SimError> {
        use VirusStatus::*;
        let time = match (current, next) {
            (Exposed, Asymptomatic | Presymptomatic) => self.time_latent,
            (Asymptomatic, Recovered) => self.time_recovery_asymp,
            (Presymptomatic, Symptomatic) => self.time_symptoms_onset,
            (Symptomatic, SeverelySymptomatic) => self.time_decline,
            (Symptomatic, Recovered) => self.time_recovery_symp,
            (SeverelySymptomatic, Recovered) => self.time_recovery_sev,
            (SeverelySymptomatic, Dead) => self.time_death,
            _ => {
                return Err(SimError::UnreachableTransition(format!(
                    "no progression time for {current:?} -> {next:?}"
                )))
            }
        };
        Ok(self.progression(time))
    }

    /// The delay in days before an alert moves from `current` to `next`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnreachableTransition` for a pair the alert graph never produces.
    pub fn alert_time(
        &self,
        current: AlertStatus,
        next: AlertStatus,
    ) -> Result<Distribution, SimError> {
        use AlertStatus::*;
        match (current, next) {
            (RequestedTest, AwaitingResult) => Ok(self.time_test_administered),
            (AwaitingResult, TestedPositive | TestedNegative) => Ok(self.time_test_result),
            // Scheduled delays are clamped to one step.
            (Alerted, RequestedTest) | (TestedPositive | TestedNegative, None) => {
                Ok(Distribution::flat(0))
            }
            _ => Err(SimError::UnreachableTransition(format!(
                "no alert time for {current:?} -> {next:?}"
            ))),
        }
    }

    /// Logit of the exposure probability at unit contact weight.
    #[must_use]
    pub fn exposure_bias(&self) -> f64 {
        let p = self.exposure_probability_4_unit_contact;
        (p / (1.0 - p)).ln()
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for any out-of-range parameter.
    pub fn validate(&self) -> Result<(), SimError> {
        let progression = [
            ("time_latent", self.time_latent),
            ("time_recovery_asymp", self.time_recovery_asymp),
            ("time_recovery_symp", self.time_recovery_symp),
            ("time_recovery_sev", self.time_recovery_sev),
            ("time_symptoms_onset", self.time_symptoms_onset),
            ("time_decline", self.time_decline),
            ("time_death", self.time_death),
        ];
        for (name, time) in progression {
            self.progression(time).validate(name)?;
        }
        self.time_test_administered
            .validate("time_test_administered")?;
        self.time_test_result.validate("time_test_result")?;

        let p = self.exposure_probability_4_unit_contact;
        if !(p > 0.0 && p < 1.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "exposure_probability_4_unit_contact must be in (0, 1), got {p}"
            )));
        }
        check_non_negative("exposure_exponent", self.exposure_exponent)?;
        check_non_negative("exposure_threshold", self.exposure_threshold)?;
        check_non_negative("random_infection_rate", self.random_infection_rate)?;
        if let Some(accuracy) = self.test_positive_accuracy {
            check_probability("test_positive_accuracy", accuracy)?;
        }
        if let Some(accuracy) = self.test_negative_accuracy {
            check_probability("test_negative_accuracy", accuracy)?;
        }
        Ok(())
    }
}

/// Who gets alerted when a case tests positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactTracingProperties {
    /// How far back, in days, contacts are traced.
    pub window_days: i64,
    #[serde(default)]
    pub min_weight: f64,
}

impl ContactTracingProperties {
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for a negative window or weight.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.window_days < 0 {
            return Err(SimError::InvalidConfiguration(
                "contact_tracing.window_days must not be negative".to_string(),
            ));
        }
        check_non_negative("contact_tracing.min_weight", self.min_weight)
    }
}

/// Everything read from a properties file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationProperties {
    pub standard: StandardProperties,
    pub disease: DiseaseProperties,
    pub isolation: IsolationProperties,
    #[serde(default)]
    pub contact_tracing: Option<ContactTracingProperties>,
}

impl SimulationProperties {
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for the first invalid section.
    pub fn validate(&self) -> Result<(), SimError> {
        self.standard.validate()?;
        self.disease.validate()?;
        self.isolation.validate()?;
        if let Some(tracing) = &self.contact_tracing {
            tracing.validate()?;
        }
        Ok(())
    }
}
