//! Reference capture: the user types a trigger word and the frame is taken
//! partway through, while they are sitting naturally.

use std::io::{Stdout, Write};

use badbits_core::error::{BadbitsError, Result};
use badbits_runtime::display::ReferenceRitual;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Not the next letter of the word.
    Ignored,
    Accepted,
    /// Accepted, and this is the moment to take the picture.
    Capture,
    /// The last letter.
    Complete,
}

/// Tracks how much of the trigger word has been typed.
#[derive(Debug, Clone)]
pub struct TriggerProgress {
    word: Vec<char>,
    typed: usize,
}

impl TriggerProgress {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.trim().to_lowercase().chars().collect(),
            typed: 0,
        }
    }

    /// Letters typed before the frame is captured: half the word, at least one.
    pub fn capture_point(&self) -> usize {
        (self.word.len() / 2).max(1)
    }

    pub fn typed(&self) -> usize {
        self.typed
    }

    pub fn is_complete(&self) -> bool {
        self.typed >= self.word.len()
    }

    /// Letters match case-insensitively.
    pub fn push(&mut self, c: char) -> Keystroke {
        let Some(&expected) = self.word.get(self.typed) else {
            return Keystroke::Ignored;
        };
        if !c.to_lowercase().eq(expected.to_lowercase()) {
            return Keystroke::Ignored;
        }

        self.typed += 1;
        if self.is_complete() {
            Keystroke::Complete
        } else if self.typed == self.capture_point() {
            Keystroke::Capture
        } else {
            Keystroke::Accepted
        }
    }
}

pub fn instructions(trigger_word: &str) -> String {
    format!(
        "\n📸 Reference posture\n\
         Sit the way you want to sit for the rest of the session.\n\
         Type the word '{trigger_word}' and the picture is taken while you type.\n\
         Press Ctrl+C to cancel.\n\n> "
    )
}

/// Reads keystrokes from the terminal in raw mode.
pub struct TerminalRitual<W> {
    out: W,
}

impl TerminalRitual<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalRitual<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn read_word(
        &mut self,
        progress: &mut TriggerProgress,
        capture: &mut dyn FnMut() -> Result<RgbImage>,
    ) -> Result<RgbImage> {
        let mut frame = None;
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let c = match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(BadbitsError::Interrupted);
                }
                KeyCode::Esc => return Err(BadbitsError::Interrupted),
                KeyCode::Char(c) => c,
                _ => continue,
            };

            let step = progress.push(c);
            if step == Keystroke::Ignored {
                continue;
            }
            write!(self.out, "{c}")?;
            self.out.flush()?;

            match step {
                Keystroke::Capture => frame = Some(capture()?),
                Keystroke::Complete => {
                    return match frame {
                        Some(frame) => Ok(frame),
                        None => capture(),
                    };
                }
                _ => {}
            }
        }
    }
}

impl<W: Write> ReferenceRitual for TerminalRitual<W> {
    fn perform(
        &mut self,
        trigger_word: &str,
        capture: &mut dyn FnMut() -> Result<RgbImage>,
    ) -> Result<RgbImage> {
        let mut progress = TriggerProgress::new(trigger_word);
        write!(self.out, "{}", instructions(trigger_word))?;
        self.out.flush()?;

        enable_raw_mode()?;
        let outcome = self.read_word(&mut progress, capture);
        disable_raw_mode()?;

        let frame = outcome?;
        writeln!(self.out, "\n\nReference image captured! 📸")?;
        self.out.flush()?;
        Ok(frame)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_happens_halfway() {
        let mut progress = TriggerProgress::new("yellow");
        assert_eq!(progress.capture_point(), 3);
        assert_eq!(progress.push('y'), Keystroke::Accepted);
        assert_eq!(progress.push('e'), Keystroke::Accepted);
        assert_eq!(progress.push('l'), Keystroke::Capture);
        assert_eq!(progress.push('l'), Keystroke::Accepted);
        assert_eq!(progress.push('o'), Keystroke::Accepted);
        assert_eq!(progress.push('w'), Keystroke::Complete);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_wrong_letters_are_ignored() {
        let mut progress = TriggerProgress::new("ok");
        assert_eq!(progress.push('x'), Keystroke::Ignored);
        assert_eq!(progress.typed(), 0);
        assert_eq!(progress.push('O'), Keystroke::Capture);
        assert_eq!(progress.push('K'), Keystroke::Complete);
        assert_eq!(progress.push('k'), Keystroke::Ignored);
    }

    #[test]
    fn test_single_letter_word_completes_without_capture_step() {
        let mut progress = TriggerProgress::new("a");
        assert_eq!(progress.capture_point(), 1);
        assert_eq!(progress.push('a'), Keystroke::Complete);
    }

    #[test]
    fn test_instructions_name_the_word() {
        let text = instructions("banana");
        assert!(text.contains("'banana'"));
        assert!(text.contains("Ctrl+C"));
    }
}
