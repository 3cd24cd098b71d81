use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::civil_time::{CivilZone, QuietHours};
use crate::settings::NotificationPreferences;

/// When, relative to a payment date, a reminder should land.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRules {
    pub reminder_time: NaiveTime,
    pub pre_reminder_offset_days: u32,
    pub quiet_hours: Option<QuietHours>,
    pub zone: CivilZone,
}

impl DeliveryRules {
    pub fn from_preferences(preferences: &NotificationPreferences, zone: CivilZone) -> Self {
        Self {
            reminder_time: preferences.default_reminder_time,
            pre_reminder_offset_days: preferences.pre_reminder_offset_days,
            quiet_hours: preferences.quiet_hours(),
            zone,
        }
    }

    /// Wall-clock delivery time in the civil zone, after the quiet-hours shift.
    pub fn civil_delivery(&self, payment_date: NaiveDate) -> Option<NaiveDateTime> {
        let delivery_date =
            payment_date.checked_sub_days(Days::new(u64::from(self.pre_reminder_offset_days)))?;
        let civil = delivery_date.and_time(self.reminder_time);

        Some(match self.quiet_hours {
            Some(window) => window.push_out(civil),
            None => civil,
        })
    }

    pub fn delivery_instant(&self, payment_date: NaiveDate) -> Option<DateTime<Utc>> {
        self.civil_delivery(payment_date)
            .map(|civil| self.zone.to_utc(civil))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DoNotDisturb;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rules(time: NaiveTime, offset: u32, quiet: Option<(NaiveTime, NaiveTime)>) -> DeliveryRules {
        DeliveryRules {
            reminder_time: time,
            pre_reminder_offset_days: offset,
            quiet_hours: quiet.map(|(start, end)| QuietHours::new(start, end)),
            zone: CivilZone::home(),
        }
    }

    #[test]
    fn test_same_day_reminder() {
        let civil = rules(t(9, 0), 0, None).civil_delivery(d(2024, 2, 1)).unwrap();
        assert_eq!(civil, d(2024, 2, 1).and_time(t(9, 0)));
    }

    #[test]
    fn test_pre_reminder_crosses_month_boundary() {
        let civil = rules(t(9, 0), 3, None).civil_delivery(d(2024, 3, 1)).unwrap();
        assert_eq!(civil, d(2024, 2, 27).and_time(t(9, 0)));
    }

    #[test]
    fn test_wrapping_quiet_hours_move_to_next_morning() {
        let civil = rules(t(23, 30), 0, Some((t(22, 0), t(8, 0))))
            .civil_delivery(d(2024, 5, 10))
            .unwrap();
        assert_eq!(civil, d(2024, 5, 11).and_time(t(8, 0)));
    }

    #[test]
    fn test_plain_quiet_hours_move_within_day() {
        let civil = rules(t(2, 0), 0, Some((t(1, 0), t(3, 0))))
            .civil_delivery(d(2024, 5, 10))
            .unwrap();
        assert_eq!(civil, d(2024, 5, 10).and_time(t(3, 0)));
    }

    #[test]
    fn test_quiet_hours_apply_after_offset() {
        let civil = rules(t(23, 0), 1, Some((t(22, 0), t(7, 0))))
            .civil_delivery(d(2024, 1, 1))
            .unwrap();
        // Offset lands on Dec 31 23:00, the shift pushes it to the due date itself.
        assert_eq!(civil, d(2024, 1, 1).and_time(t(7, 0)));
    }

    #[test]
    fn test_delivery_instant_is_resolved_from_civil_zone() {
        let instant = rules(t(9, 0), 0, None).delivery_instant(d(2024, 2, 1)).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_rules_from_preferences_skip_disabled_dnd() {
        let prefs = NotificationPreferences {
            global_enabled: true,
            default_reminder_time: t(23, 30),
            pre_reminder_offset_days: 0,
            do_not_disturb: Some(DoNotDisturb {
                enabled: false,
                start: t(22, 0),
                end: t(8, 0),
            }),
        };

        let rules = DeliveryRules::from_preferences(&prefs, CivilZone::home());
        assert_eq!(
            rules.civil_delivery(d(2024, 5, 10)),
            Some(d(2024, 5, 10).and_time(t(23, 30)))
        );
    }
}
