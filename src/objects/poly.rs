//! `poly` - polyphonic voice allocator.
//!
//! Pitch/velocity pairs come in; voice number, pitch, and velocity go out
//! (rightmost outlet first, as usual). Note-ons take the vacant voice that
//! has been idle longest. When every voice is busy and stealing is enabled,
//! the oldest active voice is released and retaken; otherwise the note is
//! dropped. Note-offs release the oldest active voice with a matching pitch.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

#[derive(Clone, Copy, Default)]
struct Voice {
    pitch: f32,
    used: bool,
    serial: u64,
}

pub struct Poly {
    voices: Vec<Voice>,
    velocity: f32,
    serial: u64,
    steal: bool,
}

impl Poly {
    pub fn new(init: &Message) -> Self {
        let count = match init.float_at(0) {
            Some(f) if f > 1.0 => f as usize,
            _ => 1,
        };
        Poly {
            voices: vec![Voice::default(); count],
            velocity: 0.0,
            serial: 0,
            steal: init.float_at(1) == Some(1.0),
        }
    }

    fn emit(&self, ctx: &mut MessageCtx<'_>, timestamp: f64, voice: usize, pitch: f32, velocity: f32) {
        ctx.send(2, Message::float(timestamp, velocity));
        ctx.send(1, Message::float(timestamp, pitch));
        ctx.send(0, Message::float(timestamp, voice as f32 + 1.0));
    }

    fn note_on(&mut self, timestamp: f64, pitch: f32, ctx: &mut MessageCtx<'_>) {
        let mut oldest_active: Option<usize> = None;
        let mut oldest_vacant: Option<usize> = None;
        for (i, voice) in self.voices.iter().enumerate() {
            let slot = if voice.used {
                &mut oldest_active
            } else {
                &mut oldest_vacant
            };
            match slot {
                Some(best) if self.voices[*best].serial <= voice.serial => {}
                _ => *slot = Some(i),
            }
        }

        if let Some(i) = oldest_vacant {
            self.emit(ctx, timestamp, i, pitch, self.velocity);
            self.voices[i] = Voice {
                pitch,
                used: true,
                serial: self.next_serial(),
            };
        } else if let (Some(i), true) = (oldest_active, self.steal) {
            // Release the stolen voice, then retake it.
            let stolen_pitch = self.voices[i].pitch;
            self.emit(ctx, timestamp, i, stolen_pitch, 0.0);
            self.emit(ctx, timestamp, i, pitch, self.velocity);
            self.voices[i].pitch = pitch;
            self.voices[i].serial = self.next_serial();
        }
    }

    fn note_off(&mut self, timestamp: f64, pitch: f32, ctx: &mut MessageCtx<'_>) {
        let mut oldest_match: Option<usize> = None;
        for (i, voice) in self.voices.iter().enumerate() {
            if voice.used && voice.pitch == pitch {
                match oldest_match {
                    Some(best) if self.voices[best].serial <= voice.serial => {}
                    _ => oldest_match = Some(i),
                }
            }
        }
        if let Some(i) = oldest_match {
            self.voices[i].used = false;
            self.voices[i].serial = self.next_serial();
            self.emit(ctx, timestamp, i, self.voices[i].pitch, 0.0);
        }
    }

    fn next_serial(&mut self) -> u64 {
        let serial = self.serial;
        self.serial += 1;
        serial
    }
}

impl PatchObject for Poly {
    fn label(&self) -> &'static str {
        "poly"
    }

    fn message_inlets(&self) -> usize {
        2
    }

    fn message_outlets(&self) -> usize {
        3
    }

    fn process_message(&mut self, inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        match inlet {
            0 => {
                if let Some(pitch) = message.float_at(0) {
                    if let Some(velocity) = message.float_at(1) {
                        self.velocity = velocity;
                    }
                    if self.velocity > 0.0 {
                        self.note_on(message.timestamp(), pitch, ctx);
                    } else {
                        self.note_off(message.timestamp(), pitch, ctx);
                    }
                }
            }
            1 => {
                if let Some(velocity) = message.float_at(0) {
                    self.velocity = velocity;
                }
            }
            _ => {}
        }
    }

    fn should_distribute(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::Bench;

    /// Flatten emissions to (outlet, value) pairs in emission order.
    fn pairs(out: &[(usize, Message)]) -> Vec<(usize, f32)> {
        out.iter()
            .map(|(outlet, message)| (*outlet, message.float_at(0).unwrap()))
            .collect()
    }

    fn note(poly: &mut Poly, bench: &mut Bench, pitch: f32, velocity: f32) -> Vec<(usize, f32)> {
        let message = Message::new(0.0)
            .with_atom(crate::message::Atom::Float(pitch))
            .with_atom(crate::message::Atom::Float(velocity));
        pairs(&bench.deliver(poly, 0, message))
    }

    #[test]
    fn notes_fill_vacant_voices_in_order() {
        let mut bench = Bench::new();
        let mut poly = Poly::new(&Message::float(0.0, 4.0));

        assert_eq!(
            note(&mut poly, &mut bench, 60.0, 100.0),
            vec![(2, 100.0), (1, 60.0), (0, 1.0)]
        );
        assert_eq!(
            note(&mut poly, &mut bench, 64.0, 100.0),
            vec![(2, 100.0), (1, 64.0), (0, 2.0)]
        );
    }

    #[test]
    fn note_off_releases_the_voice_for_reuse() {
        let mut bench = Bench::new();
        let mut poly = Poly::new(&Message::float(0.0, 2.0));

        note(&mut poly, &mut bench, 60.0, 100.0); // voice 1
        note(&mut poly, &mut bench, 64.0, 100.0); // voice 2
        assert_eq!(
            note(&mut poly, &mut bench, 60.0, 0.0),
            vec![(2, 0.0), (1, 60.0), (0, 1.0)]
        );
        // Voice 1 is vacant again and is the oldest vacancy.
        assert_eq!(
            note(&mut poly, &mut bench, 67.0, 100.0),
            vec![(2, 100.0), (1, 67.0), (0, 1.0)]
        );
    }

    #[test]
    fn without_stealing_extra_notes_are_dropped() {
        let mut bench = Bench::new();
        let mut poly = Poly::new(&Message::float(0.0, 2.0));
        note(&mut poly, &mut bench, 60.0, 100.0);
        note(&mut poly, &mut bench, 64.0, 100.0);
        assert!(note(&mut poly, &mut bench, 67.0, 100.0).is_empty());
    }

    #[test]
    fn stealing_releases_the_oldest_active_voice() {
        let mut bench = Bench::new();
        let mut poly = Poly::new(&Message::from_str(0.0, "2 1").unwrap());
        note(&mut poly, &mut bench, 60.0, 100.0); // voice 1, oldest
        note(&mut poly, &mut bench, 64.0, 100.0); // voice 2

        // Steal: voice 1 is released at velocity 0, then retaken.
        assert_eq!(
            note(&mut poly, &mut bench, 67.0, 100.0),
            vec![
                (2, 0.0),
                (1, 60.0),
                (0, 1.0),
                (2, 100.0),
                (1, 67.0),
                (0, 1.0),
            ]
        );
    }

    #[test]
    fn velocity_inlet_applies_to_the_next_pitch() {
        let mut bench = Bench::new();
        let mut poly = Poly::new(&Message::float(0.0, 2.0));
        bench.deliver(&mut poly, 1, Message::float(0.0, 90.0));
        let out = pairs(&bench.deliver(&mut poly, 0, Message::float(0.0, 60.0)));
        assert_eq!(out, vec![(2, 90.0), (1, 60.0), (0, 1.0)]);
    }
}
