//! Activation wizard: audience → destination → schedule → finalize.
//!
//! Finalizing makes no backend call; the activation is appended to the
//! local history.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{info, warn};

use crate::store::{ActivationRecord, SessionStore};
use crate::wizard::{Advance, Field, StepSpec, Wizard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudienceOption {
    pub audience: &'static str,
    pub segment: &'static str,
    pub count: u64,
}

pub static AUDIENCES: [AudienceOption; 3] = [
    AudienceOption {
        audience: "Customer Win back",
        segment: "Lapsed Customers",
        count: 24_000,
    },
    AudienceOption {
        audience: "VIP Upsell",
        segment: "High-Value VIPs",
        count: 850,
    },
    AudienceOption {
        audience: "Cart Recovery",
        segment: "Cart Abandoners",
        count: 12_500,
    },
];

const SG_DOMAIN: Field = Field::new("sg_domain", "Sender Domain");
const SG_TEMPLATE: Field = Field::new("sg_template", "Template ID");
const TW_FROM: Field = Field::new("tw_from", "From Number");
const TW_TEMPLATE: Field = Field::new("tw_template", "Message Template");
const GA_ACCOUNT: Field = Field::new("ga_account", "Customer Account ID");
const GA_ACTION: Field = Field::new("ga_action", "Conversion Action");
const SFTP_HOST: Field = Field::new("sftp_host", "Host");
const SFTP_USER: Field = Field::new("sftp_user", "Username");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    SendGrid,
    TwilioSms,
    GoogleAds,
    SftpChannel,
    Braze,
}

impl Destination {
    pub const ALL: [Destination; 5] = [
        Destination::SendGrid,
        Destination::TwilioSms,
        Destination::GoogleAds,
        Destination::SftpChannel,
        Destination::Braze,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Destination::SendGrid => "SendGrid",
            Destination::TwilioSms => "Twilio SMS",
            Destination::GoogleAds => "Google Ads",
            Destination::SftpChannel => "SFTP Channel",
            Destination::Braze => "Braze",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// Per-destination settings, all optional
    pub fn config_fields(self) -> &'static [Field] {
        match self {
            Destination::SendGrid => &[SG_DOMAIN, SG_TEMPLATE],
            Destination::TwilioSms => &[TW_FROM, TW_TEMPLATE],
            Destination::GoogleAds => &[GA_ACCOUNT, GA_ACTION],
            Destination::SftpChannel => &[SFTP_HOST, SFTP_USER],
            Destination::Braze => &[],
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleKind {
    #[default]
    Daily,
    Every,
    Once,
}

impl ScheduleKind {
    pub fn label(self) -> &'static str {
        match self {
            ScheduleKind::Daily => "Daily",
            ScheduleKind::Every => "Every",
            ScheduleKind::Once => "Once",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ScheduleKind::Daily => ScheduleKind::Every,
            ScheduleKind::Every => ScheduleKind::Once,
            ScheduleKind::Once => ScheduleKind::Daily,
        }
    }
}

/// 12-hour wall clock time, `03:00 AM` by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    hour: u8,
    minute: u8,
    pm: bool,
}

impl Default for ScheduleTime {
    fn default() -> Self {
        Self {
            hour: 3,
            minute: 0,
            pm: false,
        }
    }
}

impl ScheduleTime {
    /// `None` unless `1 ≤ hour ≤ 12` and `minute < 60`
    pub fn new(hour: u8, minute: u8, pm: bool) -> Option<Self> {
        ((1..=12).contains(&hour) && minute < 60).then_some(Self { hour, minute, pm })
    }

    /// Step the hour, wrapping 12 → 1
    pub fn shift_hour(&mut self, forward: bool) {
        self.hour = match (self.hour, forward) {
            (12, true) => 1,
            (1, false) => 12,
            (h, true) => h + 1,
            (h, false) => h - 1,
        };
    }

    /// Step the minute by five, wrapping within the hour
    pub fn shift_minute(&mut self, forward: bool) {
        self.minute = if forward {
            (self.minute / 5 * 5 + 5) % 60
        } else {
            (self.minute / 5 * 5 + 55) % 60
        };
    }

    pub fn toggle_meridiem(&mut self) {
        self.pm = !self.pm;
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meridiem = if self.pm { "PM" } else { "AM" };
        write!(f, "{:02}:{:02} {meridiem}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub kind: ScheduleKind,
    every_days: u32,
    pub time: ScheduleTime,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            kind: ScheduleKind::Daily,
            every_days: 1,
            time: ScheduleTime::default(),
        }
    }
}

impl Schedule {
    pub fn every_days(&self) -> u32 {
        self.every_days
    }

    /// Interval for `Every`; anything below one day becomes one
    pub fn set_every_days(&mut self, days: u32) {
        self.every_days = days.max(1);
    }

    pub fn describe(&self) -> String {
        match self.kind {
            ScheduleKind::Daily => format!("Daily at {}", self.time),
            ScheduleKind::Every => format!("Every {} day(s) at {}", self.every_days, self.time),
            ScheduleKind::Once => format!("Once at {}", self.time),
        }
    }
}

/// What the Finalize step shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationSummary {
    pub audience: &'static str,
    pub segment: &'static str,
    pub count: u64,
    pub destination: String,
    pub schedule: String,
    pub exclude_previous: bool,
}

pub const DESTINATION: Field = Field::new("destination", "Destination");

pub const ACTIVATION_STEPS: [&str; 4] =
    ["Select Target Audience", "Select Destination", "Schedule", "Finalize"];

static STEPS: [StepSpec; 4] = [
    StepSpec::new(ACTIVATION_STEPS[0]).needs_selection(),
    StepSpec::new(ACTIVATION_STEPS[1]).require(&[DESTINATION]),
    StepSpec::new(ACTIVATION_STEPS[2]),
    StepSpec::new(ACTIVATION_STEPS[3]).needs_selection(),
];

pub struct ActivationFlow {
    /// Selection is the index into `AUDIENCES`
    wizard: Wizard<usize, ActivationRecord>,
    schedule: Schedule,
    exclude_previous: bool,
}

impl Default for ActivationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationFlow {
    pub fn new() -> Self {
        let mut wizard = Wizard::new(&STEPS);
        wizard.select_option(0);
        Self {
            wizard,
            schedule: Schedule::default(),
            exclude_previous: true,
        }
    }

    pub fn wizard(&self) -> &Wizard<usize, ActivationRecord> {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard<usize, ActivationRecord> {
        &mut self.wizard
    }

    pub fn audience(&self) -> Option<&'static AudienceOption> {
        self.wizard.selection().and_then(|i| AUDIENCES.get(*i))
    }

    pub fn select_audience(&mut self, index: usize) {
        if index < AUDIENCES.len() {
            self.wizard.select_option(index);
        }
    }

    pub fn destination(&self) -> Option<Destination> {
        Destination::from_name(self.wizard.draft().get(DESTINATION.name))
    }

    pub fn select_destination(&mut self, destination: Destination) {
        self.wizard.set_field(DESTINATION.name, destination.name());
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub fn exclude_previous(&self) -> bool {
        self.exclude_previous
    }

    pub fn toggle_exclude_previous(&mut self) {
        self.exclude_previous = !self.exclude_previous;
    }

    pub fn summary(&self) -> Option<ActivationSummary> {
        let audience = self.audience()?;
        Some(ActivationSummary {
            audience: audience.audience,
            segment: audience.segment,
            count: audience.count,
            destination: self
                .destination()
                .map_or_else(|| "Not selected".to_string(), |d| d.name().to_string()),
            schedule: self.schedule.describe(),
            exclude_previous: self.exclude_previous,
        })
    }

    /// History entry for the current choices
    pub fn record_at(&self, now: DateTime<Utc>) -> Option<ActivationRecord> {
        let audience = self.audience()?;
        Some(ActivationRecord {
            id: format!("act-{}", now.timestamp_millis()),
            audience: format!("{} • {}", audience.audience, audience.segment),
            channel: self
                .destination()
                .map_or_else(|| "N/A".to_string(), |d| d.name().to_string()),
            count: audience.count,
            scheduled_for: self.schedule.describe(),
            created_at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        })
    }

    /// Next / Start Campaign
    pub fn proceed(&mut self, store: &mut SessionStore) -> Advance {
        self.proceed_at(store, Utc::now())
    }

    pub fn proceed_at(&mut self, store: &mut SessionStore, now: DateTime<Utc>) -> Advance {
        let outcome = self.wizard.advance();
        if outcome != Advance::Submit {
            return outcome;
        }
        let Some(record) = self.record_at(now) else {
            return outcome;
        };
        if !self.wizard.begin_submit() {
            return outcome;
        }

        let result = store.record_activation(record.clone()).map(|()| record);
        match &result {
            Ok(record) => info!(id = %record.id, channel = %record.channel, "activation finalized"),
            Err(e) => warn!(error = %e, "failed to record activation"),
        }
        self.wizard.finish_submit(result);
        outcome
    }

    pub fn back(&mut self) -> bool {
        self.wizard.retreat()
    }

    pub fn cancel(&mut self) {
        self.wizard.cancel();
        self.schedule = Schedule::default();
        self.exclude_previous = true;
    }

    /// Body of the completion modal
    pub fn completion_message(&self) -> Option<String> {
        if !self.wizard.is_complete() {
            return None;
        }
        let audience = self.audience()?;
        let channel = self
            .destination()
            .map_or("N/A", Destination::name)
            .to_uppercase();
        Some(format!(
            "Your activation has been finalized.\nAudience: {} ({})\nChannel: {} • Schedule: {}",
            audience.segment,
            group_thousands(audience.count),
            channel,
            self.schedule.describe()
        ))
    }
}

/// `24000` → `24,000`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_text() {
        let mut schedule = Schedule::default();
        assert_eq!(schedule.describe(), "Daily at 03:00 AM");

        schedule.kind = ScheduleKind::Every;
        schedule.set_every_days(2);
        assert_eq!(schedule.describe(), "Every 2 day(s) at 03:00 AM");

        schedule.kind = ScheduleKind::Once;
        schedule.time = ScheduleTime::new(11, 30, true).unwrap();
        assert_eq!(schedule.describe(), "Once at 11:30 PM");
    }

    #[test]
    fn test_every_days_floor_is_one() {
        let mut schedule = Schedule::default();
        schedule.set_every_days(0);
        assert_eq!(schedule.every_days(), 1);
    }

    #[test]
    fn test_time_wraps() {
        let mut time = ScheduleTime::new(12, 55, false).unwrap();
        time.shift_hour(true);
        time.shift_minute(true);
        assert_eq!(time.to_string(), "01:00 AM");
        time.shift_hour(false);
        time.shift_minute(false);
        assert_eq!(time.to_string(), "12:55 AM");
        assert!(ScheduleTime::new(13, 0, false).is_none());
        assert!(ScheduleTime::new(0, 0, false).is_none());
    }

    #[test]
    fn test_destination_required_on_step_two() {
        let mut flow = ActivationFlow::new();
        let mut store = SessionStore::in_memory();
        assert_eq!(flow.proceed(&mut store), Advance::Moved(2));
        assert!(matches!(flow.proceed(&mut store), Advance::Blocked(_)));

        flow.select_destination(Destination::Braze);
        assert_eq!(flow.proceed(&mut store), Advance::Moved(3));
    }

    #[test]
    fn test_record_fields() {
        let mut flow = ActivationFlow::new();
        flow.select_audience(1);
        flow.select_destination(Destination::TwilioSms);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        let record = flow.record_at(now).unwrap();
        assert_eq!(record.id, format!("act-{}", now.timestamp_millis()));
        assert_eq!(record.audience, "VIP Upsell • High-Value VIPs");
        assert_eq!(record.channel, "Twilio SMS");
        assert_eq!(record.count, 850);
        assert_eq!(record.created_at, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_cancel_clears_audience() {
        let mut flow = ActivationFlow::new();
        flow.select_destination(Destination::SendGrid);
        flow.toggle_exclude_previous();
        flow.cancel();
        assert!(flow.audience().is_none());
        assert!(flow.destination().is_none());
        assert!(flow.exclude_previous());
        assert_eq!(flow.wizard().step(), 1);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(850), "850");
        assert_eq!(group_thousands(24_000), "24,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
