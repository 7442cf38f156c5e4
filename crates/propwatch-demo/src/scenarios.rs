#![forbid(unsafe_code)]

//! Demo scenarios. Each one builds a small model, subscribes observers that
//! describe what they see, and performs a few writes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use propwatch::{
    Observable, ObservableError, ObservableProperty, Observer, Phase, observable_attributes,
    subscribe, unsubscribe,
};

/// Selectable scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    All,
    Basic,
    Facade,
    Phases,
    Computed,
    Recursion,
    Async,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::All,
        Scenario::Basic,
        Scenario::Facade,
        Scenario::Phases,
        Scenario::Computed,
        Scenario::Recursion,
        Scenario::Async,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Basic => "basic",
            Self::Facade => "facade",
            Self::Phases => "phases",
            Self::Computed => "computed",
            Self::Recursion => "recursion",
            Self::Async => "async",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.name() == lower)
    }
}

/// Lines produced by observers, optionally echoed to stdout as they arrive.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
    echo: bool,
}

impl Transcript {
    #[must_use]
    pub fn new(echo: bool) -> Self {
        Self {
            lines: Rc::default(),
            echo,
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        self.lines.borrow_mut().push(line);
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

// ── Models ────────────────────────────────────────────────────────────────

/// Plain type with one observable attribute, addressed through free functions.
pub struct Reading {
    value: ObservableProperty<Reading, i64>,
}

observable_attributes!(Reading { value });

impl Reading {
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            value: ObservableProperty::new("value", initial),
        }
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.value.get(self)
    }

    pub fn set_value(&self, value: i64) -> propwatch::Result<()> {
        self.value.set(self, value)
    }
}

/// Same shape as [`Reading`], opted into the façade.
pub struct Gauge {
    value: ObservableProperty<Gauge, i64>,
}

observable_attributes!(Gauge { value });
impl Observable for Gauge {}

impl Gauge {
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            value: ObservableProperty::new("value", initial),
        }
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.value.get(self)
    }

    pub fn set_value(&self, value: i64) -> propwatch::Result<()> {
        self.value.set(self, value)
    }
}

/// Box whose `volume` is derived from its three sides.
pub struct Carton {
    sides: RefCell<[u32; 3]>,
    volume: ObservableProperty<Carton, u32>,
}

observable_attributes!(Carton { volume });
impl Observable for Carton {}

impl Carton {
    #[must_use]
    pub fn new(sides: [u32; 3]) -> Self {
        Self {
            sides: RefCell::new(sides),
            volume: ObservableProperty::computed("volume", |c: &Carton| {
                c.sides
                    .borrow()
                    .iter()
                    .fold(1, |acc: u32, side| acc.saturating_mul(*side))
            }),
        }
    }

    #[must_use]
    pub fn volume(&self) -> u32 {
        self.volume.get(self)
    }

    /// Scale every side, notifying `volume` observers once.
    pub fn scale(&self, factor: u32) -> propwatch::Result<()> {
        self.changing::<u32, _, _, _>("volume", |this| {
            for side in this.sides.borrow_mut().iter_mut() {
                *side = side.saturating_mul(factor);
            }
            Ok(())
        })
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────

/// Run `scenario` (or every scenario for [`Scenario::All`]).
///
/// # Errors
///
/// Any unexpected error from the library.
pub fn run(scenario: Scenario, out: &Transcript, async_delay: Duration) -> propwatch::Result<()> {
    match scenario {
        Scenario::All => {
            for s in Scenario::ALL.into_iter().skip(1) {
                run(s, out, async_delay)?;
            }
            Ok(())
        }
        Scenario::Basic => basic(out),
        Scenario::Facade => facade(out),
        Scenario::Phases => phases(out),
        Scenario::Computed => computed(out),
        Scenario::Recursion => recursion(out),
        Scenario::Async => async_observer(out, async_delay),
    }
}

fn describe_change(out: &Transcript) -> Observer<Reading, i64> {
    let out = out.clone();
    Observer::with_name("describe_change", move |r: &Reading, name: &str, new: &i64| {
        out.line(format!("Reading.{name} changes from {} to {new}", r.value()));
        Ok(())
    })
}

fn basic(out: &Transcript) -> propwatch::Result<()> {
    tracing::info!(scenario = "basic", "running");
    let reading = Reading::new(0);
    reading.set_value(1000)?;
    out.line(format!("Current value of reading: {}", reading.value()));

    let observer = describe_change(out);
    subscribe(&observer, &reading, "value", Phase::Before)?;
    reading.set_value(2000)?;

    unsubscribe(&observer, &reading, "value")?;
    reading.set_value(3000)?;
    out.line(format!("Unobserved write, value is now {}", reading.value()));
    Ok(())
}

fn facade(out: &Transcript) -> propwatch::Result<()> {
    tracing::info!(scenario = "facade", "running");
    let gauge = Gauge::new(0);
    let line_out = out.clone();
    let on_change = Observer::with_name("on_change", move |g: &Gauge, _: &str, new: &i64| {
        line_out.line(format!("gauge.value changes from {} to {new}", g.value()));
        Ok(())
    });
    gauge.subscribe("value", &on_change, Phase::Before)?;
    gauge.set_value(900)?;

    gauge.unsubscribe("value", &on_change)?;
    gauge.set_value(500)?;

    let value_out = out.clone();
    let handle = gauge.on_change("value", Phase::After, move |v: &i64| {
        value_out.line(format!("gauge.value is now {v}"));
        Ok(())
    })?;
    gauge.set_value(750)?;
    gauge.unsubscribe("value", &handle)?;
    Ok(())
}

fn phases(out: &Transcript) -> propwatch::Result<()> {
    tracing::info!(scenario = "phases", "running");
    let gauge = Gauge::new(5);
    let before_out = out.clone();
    let before = Observer::with_name("before", move |g: &Gauge, _: &str, new: &i64| {
        before_out.line(format!("before: stored={} incoming={new}", g.value()));
        Ok(())
    });
    let after_out = out.clone();
    let after = Observer::with_name("after", move |g: &Gauge, _: &str, new: &i64| {
        after_out.line(format!("after: stored={} incoming={new}", g.value()));
        Ok(())
    });
    gauge.subscribe("value", &after, Phase::After)?;
    gauge.subscribe("value", &before, Phase::Before)?;
    gauge.set_value(9)?;
    out.line(format!("final read: {}", gauge.value()));
    Ok(())
}

fn computed(out: &Transcript) -> propwatch::Result<()> {
    tracing::info!(scenario = "computed", "running");
    let carton = Carton::new([1, 2, 3]);
    let before_out = out.clone();
    let before = Observer::with_name("volume_before", move |c: &Carton, _: &str, new: &u32| {
        before_out.line(format!("volume before notify: read={} new={new}", c.volume()));
        Ok(())
    });
    carton.subscribe("volume", &before, Phase::Before)?;
    let after_out = out.clone();
    carton.on_change("volume", Phase::After, move |v: &u32| {
        after_out.line(format!("volume is now {v}"));
        Ok(())
    })?;
    carton.scale(2)?;

    if let Err(err) = carton.volume.set(&carton, 1) {
        out.line(format!("direct write refused: {err}"));
    }
    Ok(())
}

fn recursion(out: &Transcript) -> propwatch::Result<()> {
    tracing::info!(scenario = "recursion", "running");
    let gauge = Gauge::new(0);
    let attempts = Rc::new(Cell::new(0u32));
    let attempts_clone = Rc::clone(&attempts);
    let invalid = Observer::with_name("invalid_observer", move |g: &Gauge, _: &str, v: &i64| {
        attempts_clone.set(attempts_clone.get() + 1);
        g.set_value(v + 1)
    });
    gauge.subscribe("value", &invalid, Phase::After)?;

    match gauge.set_value(4) {
        Err(err @ ObservableError::Mutation { .. }) => out.line(format!("rejected: {err}")),
        Err(other) => return Err(other),
        Ok(()) => out.line("unexpected: re-entrant write accepted"),
    }
    gauge.unsubscribe("value", &invalid)?;
    gauge.set_value(10)?;
    out.line(format!(
        "observer ran {} time(s); later write stored {}",
        attempts.get(),
        gauge.value()
    ));
    Ok(())
}

fn async_observer(out: &Transcript, delay: Duration) -> propwatch::Result<()> {
    tracing::info!(scenario = "async", delay = ?delay, "running");
    let gauge = Gauge::new(0);
    let slow_out = out.clone();
    let slow = Observer::from_async(move |_: &Gauge, _: &str, new: &i64| {
        let new = *new;
        let out = slow_out.clone();
        async move {
            let (tx, rx) = futures::channel::oneshot::channel();
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                let _ = tx.send(());
            });
            rx.await
                .map_err(|e| ObservableError::callback(e.to_string()))?;
            out.line(format!("async observer finished: value={new}"));
            Ok(())
        }
    });
    let next_out = out.clone();
    gauge.subscribe("value", &slow, Phase::After)?;
    gauge.on_change("value", Phase::After, move |v: &i64| {
        next_out.line(format!("next observer: value={v}"));
        Ok(())
    })?;
    gauge.set_value(7)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_of(scenario: Scenario) -> Vec<String> {
        let out = Transcript::new(false);
        run(scenario, &out, Duration::from_millis(1)).unwrap();
        out.lines()
    }

    #[test]
    fn scenario_names_round_trip() {
        for s in Scenario::ALL {
            assert_eq!(Scenario::from_name(s.name()), Some(s));
        }
        assert_eq!(Scenario::from_name(" Phases "), Some(Scenario::Phases));
        assert_eq!(Scenario::from_name("nope"), None);
    }

    #[test]
    fn basic_transcript() {
        assert_eq!(
            transcript_of(Scenario::Basic),
            vec![
                "Current value of reading: 1000",
                "Reading.value changes from 1000 to 2000",
                "Unobserved write, value is now 3000",
            ]
        );
    }

    #[test]
    fn facade_transcript() {
        assert_eq!(
            transcript_of(Scenario::Facade),
            vec!["gauge.value changes from 0 to 900", "gauge.value is now 750"]
        );
    }

    #[test]
    fn phases_transcript() {
        assert_eq!(
            transcript_of(Scenario::Phases),
            vec![
                "before: stored=5 incoming=9",
                "after: stored=9 incoming=9",
                "final read: 9",
            ]
        );
    }

    #[test]
    fn computed_transcript() {
        let lines = transcript_of(Scenario::Computed);
        assert_eq!(lines[0], "volume before notify: read=6 new=48");
        assert_eq!(lines[1], "volume is now 48");
        assert!(lines[2].starts_with("direct write refused:"));
    }

    #[test]
    fn carton_volume_saturates() {
        let carton = Carton::new([u32::MAX, 2, 1]);
        assert_eq!(carton.volume(), u32::MAX);
        carton.scale(3).unwrap();
        assert_eq!(*carton.sides.borrow(), [u32::MAX, 6, 3]);
        assert_eq!(carton.volume(), u32::MAX);
    }

    #[test]
    fn recursion_transcript() {
        let lines = transcript_of(Scenario::Recursion);
        assert!(lines[0].starts_with("rejected: 'invalid_observer'"));
        assert_eq!(lines[1], "observer ran 1 time(s); later write stored 10");
    }

    #[test]
    fn async_transcript_keeps_order() {
        assert_eq!(
            transcript_of(Scenario::Async),
            vec!["async observer finished: value=7", "next observer: value=7"]
        );
    }

    #[test]
    fn all_runs_every_scenario() {
        let lines = transcript_of(Scenario::All);
        assert!(lines.len() >= 12);
    }
}
