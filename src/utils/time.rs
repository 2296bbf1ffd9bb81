use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse an HH:MM string into a wall-clock time
pub fn parse_clock_time(time_str: &str) -> Option<NaiveTime> {
    let (hour, minute) = parse_time(time_str)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Format a wall-clock time as zero-padded HH:MM
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse a calendar date in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Format a calendar date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Source of the current instant
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant, used by tests and tools
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// "Now" as seen on the school's wall clock, at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyMoment {
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    pub time: NaiveTime,
    pub date: NaiveDate,
}

impl DutyMoment {
    /// Resolve an instant in the given timezone
    pub fn at<T: TimeZone>(instant: DateTime<T>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        // Seconds are dropped so every call within the same minute agrees
        let time = local
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or_else(|| local.time());
        Self {
            weekday: local.weekday().num_days_from_sunday() as u8,
            time,
            date: local.date_naive(),
        }
    }

    /// Whether the inclusive window [start, end] contains this moment's time
    pub fn is_within(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start <= self.time && self.time <= end
    }

    pub fn time_string(&self) -> String {
        format_clock_time(self.time)
    }

    pub fn date_string(&self) -> String {
        format_date(self.date)
    }
}

/// Clock bound to the school's timezone
#[derive(Clone)]
pub struct SchoolClock {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl SchoolClock {
    /// Create a school clock reading from the host clock
    pub fn new(tz: Tz) -> Self {
        Self::with_clock(tz, Arc::new(SystemClock))
    }

    /// Create a school clock reading from a custom clock
    pub fn with_clock(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current local moment
    pub fn moment(&self) -> DutyMoment {
        DutyMoment::at(self.clock.now(), self.tz)
    }
}

impl std::fmt::Debug for SchoolClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchoolClock").field("tz", &self.tz).finish()
    }
}
