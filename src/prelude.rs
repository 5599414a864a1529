//! Everything needed to build and run a simulation from code.
pub use crate::case::{Case, CaseId, ExposedBy, Gender};
pub use crate::context::Context;
pub use crate::error::SimError;
pub use crate::event::{AlertEvent, ContactEvent, InfectionEvent, PolicyEvent, Time, VirusEvent};
pub use crate::event_runner::{EventRunner, RunSummary};
pub use crate::isolation::{
    AlertStatusIsolationPolicy, IsolationProperties, IsolationProperty, IsolationStartTimeType,
    ProportionInfectedIsolationPolicy, ProportionRange, VirusStatusIsolationPolicy,
};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::population::{CmptRecord, Population};
pub use crate::properties::{
    ContactTracingProperties, DiseaseProperties, ProgressionTime, SimulationProperties,
    StandardProperties,
};
pub use crate::random::{Distribution, DistributionSampler, DistributionType, RandomSampler};
pub use crate::status::{AlertStatus, VirusStatus};
