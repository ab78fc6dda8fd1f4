//! `metro` - emit bangs at a fixed millisecond interval.
//!
//! Starting emits a bang immediately and schedules the next tick; ticks
//! reschedule themselves until stopped. The scheduled tick addresses a
//! hidden inlet past the connectable ones, so patch wires can never collide
//! with the internal clock.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};
use crate::scheduler::MessageHandle;

/// Internal self-scheduling inlet; not connectable.
const TICK_INLET: usize = 2;

const MIN_INTERVAL_MS: f64 = 1.0;

pub struct Metro {
    interval_ms: f64,
    pending: Option<MessageHandle>,
}

impl Metro {
    pub fn new(init: &Message) -> Self {
        Metro {
            interval_ms: interval_from(init.float_at(0)),
            pending: None,
        }
    }

    fn start(&mut self, timestamp: f64, ctx: &mut MessageCtx<'_>) {
        self.stop(ctx);
        ctx.send(0, Message::bang(timestamp));
        self.pending =
            Some(ctx.schedule_to_self(TICK_INLET, Message::bang(timestamp + self.interval_ms)));
    }

    fn stop(&mut self, ctx: &mut MessageCtx<'_>) {
        if let Some(handle) = self.pending.take() {
            ctx.cancel(handle);
        }
    }
}

fn interval_from(value: Option<f32>) -> f64 {
    value
        .map(|f| (f as f64).max(MIN_INTERVAL_MS))
        .unwrap_or(1000.0)
}

impl PatchObject for Metro {
    fn label(&self) -> &'static str {
        "metro"
    }

    fn message_inlets(&self) -> usize {
        2
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        match inlet {
            0 => {
                if message.is_bang_at(0) || message.is_symbol_at(0, "start") {
                    self.start(message.timestamp(), ctx);
                } else if message.is_symbol_at(0, "stop") {
                    self.stop(ctx);
                } else if let Some(f) = message.float_at(0) {
                    if f != 0.0 {
                        self.start(message.timestamp(), ctx);
                    } else {
                        self.stop(ctx);
                    }
                }
            }
            1 => {
                if let Some(f) = message.float_at(0) {
                    self.interval_ms = (f as f64).max(MIN_INTERVAL_MS);
                }
            }
            TICK_INLET => {
                let timestamp = message.timestamp();
                ctx.send(0, Message::bang(timestamp));
                self.pending = Some(
                    ctx.schedule_to_self(TICK_INLET, Message::bang(timestamp + self.interval_ms)),
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Atom;
    use crate::object::test_support::Bench;

    #[test]
    fn default_interval_is_a_second() {
        let metro = Metro::new(&Message::new(0.0));
        assert_eq!(metro.interval_ms, 1000.0);
    }

    #[test]
    fn start_bangs_immediately_and_schedules_the_next_tick() {
        let mut bench = Bench::new();
        let mut metro = Metro::new(&Message::float(0.0, 250.0));

        let out = bench.deliver(&mut metro, 0, Message::bang(0.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.atom(0), Some(&Atom::Bang));
        assert_eq!(out[0].1.timestamp(), 0.0);

        let tick = bench.scheduler.pop_before(f64::MAX).unwrap();
        assert_eq!(tick.target.inlet, TICK_INLET);
        assert_eq!(tick.message.timestamp(), 250.0);
    }

    #[test]
    fn ticks_reschedule_themselves() {
        let mut bench = Bench::new();
        let mut metro = Metro::new(&Message::float(0.0, 250.0));
        bench.deliver(&mut metro, 0, Message::bang(0.0));
        let tick = bench.scheduler.pop_before(f64::MAX).unwrap();

        let out = bench.deliver(&mut metro, TICK_INLET, tick.message);
        assert_eq!(out[0].1.timestamp(), 250.0);
        let next = bench.scheduler.pop_before(f64::MAX).unwrap();
        assert_eq!(next.message.timestamp(), 500.0);
    }

    #[test]
    fn stop_cancels_the_pending_tick() {
        let mut bench = Bench::new();
        let mut metro = Metro::new(&Message::float(0.0, 250.0));
        bench.deliver(&mut metro, 0, Message::bang(0.0));
        bench.deliver(&mut metro, 0, Message::symbol(10.0, "stop"));
        assert!(bench.scheduler.pop_before(f64::MAX).is_none());
    }

    #[test]
    fn zero_float_stops_nonzero_restarts() {
        let mut bench = Bench::new();
        let mut metro = Metro::new(&Message::float(0.0, 250.0));
        bench.deliver(&mut metro, 0, Message::float(0.0, 1.0));
        bench.deliver(&mut metro, 0, Message::float(5.0, 0.0));
        assert!(bench.scheduler.pop_before(f64::MAX).is_none());
    }

    #[test]
    fn interval_updates_on_the_cold_inlet() {
        let mut bench = Bench::new();
        let mut metro = Metro::new(&Message::float(0.0, 250.0));
        bench.deliver(&mut metro, 1, Message::float(0.0, 100.0));
        bench.deliver(&mut metro, 0, Message::bang(0.0));
        let tick = bench.scheduler.pop_before(f64::MAX).unwrap();
        assert_eq!(tick.message.timestamp(), 100.0);
    }
}
