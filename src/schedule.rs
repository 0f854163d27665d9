// Cadence: which probe types fire on this invocation.
// Latency always runs; route and bandwidth run on coarser minute-of-day cycles.

use crate::config::CadenceConfig;
use chrono::Timelike;

/// What this invocation should probe beyond latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadencePlan {
    pub route: bool,
    pub bandwidth: bool,
}

/// hour*60 + minute of the local wall clock.
pub fn minute_of_day<Tz: chrono::TimeZone>(t: &chrono::DateTime<Tz>) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Pure divisibility check; the two intervals are independent moduli, so both
/// probes can coincide (minute 0, 30, ...). Periodic invocation itself is the
/// external invoker's job.
pub fn plan_for(minute: u32, cadence: &CadenceConfig) -> CadencePlan {
    CadencePlan {
        route: minute % cadence.route_every_min == 0,
        bandwidth: minute % cadence.bandwidth_every_min == 0,
    }
}
