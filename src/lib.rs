//! A discrete-event, agent-based epidemic simulator driven by recorded contacts.
//!
//! A run replays a stream of timestamped, weighted contacts between the cases of a fixed
//! population. Each case carries two state machines: its infection course (a SEIR-style
//! [`VirusStatus`]) and its testing status ([`AlertStatus`]). Contacts between an infectious
//! and a susceptible case may cause an exposure; exposures progress through the disease
//! compartments; symptomatic cases may request a test, and positive results can alert their
//! recent contacts. Isolation rules suppress weak contacts involving an isolating case.
//!
//! The central object is the [`Context`], which owns the population, the event store and the
//! single [`random::DistributionSampler`] all draws go through. The [`EventRunner`] advances it
//! one discrete time step at a time, running the event processors in a fixed order so a run
//! is reproducible from its seed:
//! * alerts, then contacts, then infections, then virus progressions
//! * placeholder policy events
//! * background random infections
//!
//! Inputs are loaded with the [`input`] module and outputs written with [`report`]; the
//! [`runner`] module wires both into the `contact_tracing_sim` command line.
pub mod case;
pub mod context;
pub mod error;
pub mod event;
pub mod event_runner;
pub mod hashing;
pub mod input;
pub mod isolation;
pub mod log;
pub mod population;
pub mod processor;
pub mod properties;
pub mod random;
pub mod report;
pub mod runner;
pub mod statistics;
pub mod status;

pub mod prelude;

pub use crate::case::{Case, CaseId, ExposedBy, Gender};
pub use crate::context::Context;
pub use crate::error::SimError;
pub use crate::event::{Event, EventStore, Time};
pub use crate::event_runner::{EventRunner, RunSummary};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::population::{CmptRecord, Population};
pub use crate::properties::SimulationProperties;
pub use crate::random::{Distribution, DistributionSampler, DistributionType, RandomSampler};
pub use crate::status::{AlertStatus, VirusStatus};
