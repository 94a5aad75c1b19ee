//! Inactivity monitoring and outreach signalling.

mod inactivity;

pub use inactivity::{
    ActivityWatch, InactivityConfig, InactivityScheduler, OutreachEvent, OutreachReceiver,
    TimerState,
};
