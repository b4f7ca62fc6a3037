use super::*;
use chrono::{Duration, TimeZone};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 3, 1, 12, 0, 0).single().expect("start")
}

#[test]
fn splits_seconds_into_units() {
    let countdown = Countdown::from_seconds(90_061);
    assert_eq!(
        countdown,
        Countdown {
            days: 1,
            hours: 1,
            minutes: 1,
            seconds: 1,
        }
    );
    assert_eq!(countdown.total_seconds(), 90_061);
}

#[test]
fn pads_minutes_only_when_hours_or_days_are_shown() {
    assert_eq!(Countdown::from_seconds(245).display(), "4:05");
    assert_eq!(Countdown::from_seconds(3_845).display(), "1:04:05");
    assert_eq!(Countdown::from_seconds(86_400 + 245).display(), "1:0:04:05");
    assert_eq!(Countdown::from_seconds(0).to_string(), "0:00");
}

#[test]
fn inactive_without_start_time_or_timeout() {
    assert_eq!(cart_timer(None, Some(15), start()), CartTimer::Inactive);
    assert_eq!(cart_timer(Some(start()), None, start()), CartTimer::Inactive);
    assert_eq!(cart_timer(Some(start()), Some(0), start()), CartTimer::Inactive);
}

#[test]
fn counts_down_from_the_cart_timeout() {
    let now = start() + Duration::seconds(61) + Duration::milliseconds(400);
    let timer = cart_timer(Some(start()), Some(15), now);

    assert_eq!(
        timer.countdown(),
        Some(Countdown {
            days: 0,
            hours: 0,
            minutes: 13,
            seconds: 58,
        })
    );
}

#[test]
fn exactly_at_the_deadline_is_still_running() {
    let now = start() + Duration::minutes(15);
    assert_eq!(
        cart_timer(Some(start()), Some(15), now),
        CartTimer::Running(Countdown::default())
    );
}

#[test]
fn expires_once_past_the_deadline() {
    let now = start() + Duration::minutes(15) + Duration::milliseconds(1);
    assert_eq!(cart_timer(Some(start()), Some(15), now), CartTimer::Expired);
    assert_eq!(CartTimer::Expired.countdown(), None);
}
