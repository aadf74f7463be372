use std::str::FromStr;

/// Which clock the node's timer engine and hyperperiod supervisor share
/// (spec §9's added note: the supervisor reads `ctx->config.clockid`, the
/// same clock the per-task timers use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockId {
    /// `CLOCK_REALTIME`.
    #[default]
    Wall,
    /// `CLOCK_MONOTONIC`.
    Monotonic,
}

impl FromStr for ClockId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wall" => Ok(ClockId::Wall),
            "monotonic" => Ok(ClockId::Monotonic),
            other => Err(format!("unknown clock id {other:?}, expected \"wall\" or \"monotonic\"")),
        }
    }
}
