//! `prenight-plots`: figure model, SVG rendering and the dashboard's plot
//! builders.
//!
//! Builders read the shared [`prenight_provider::SchedulerSnapshot`] through
//! a private [`prenight_provider::NightState`] and return an immutable
//! [`Figure`]. Figures keep their panel models so a session can redraw sky
//! maps at another slider time without touching the shared figure.

pub mod builder;
pub mod error;
pub mod figure;
pub mod footprint;
pub mod lines;
pub mod reward;
pub mod sky;
pub mod skymap;
pub mod style;
pub mod visits;

pub use builder::{NightContext, PlotBuilder, PoolKind};
pub use error::{PlotError, Result};
pub use figure::{Figure, FigureId, Panel, PanelModel, Slider};
pub use footprint::FootprintBuilder;
pub use reward::NightRewardBuilder;
pub use visits::VisitBuilder;
