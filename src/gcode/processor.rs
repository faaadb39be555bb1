// src/gcode/processor.rs
//! Line-by-line G-code stream rewriting.
//!
//! Tracks the machine state (absolute position, feed rate, relative modes)
//! across the stream and hands every absolute `G1` inside a smoothed
//! section to the [`MoveAdjuster`]. Everything else is copied through.

use std::io::{BufRead, Write};

use super::adjuster::MoveAdjuster;
use super::parser::{parse_line, Command};
use super::GCodeError;

/// Lines between progress reports.
const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
struct StreamState {
    modifying: bool,
    e_relative: bool,
    g_relative: bool,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    e: Option<f64>,
    /// Feed rate in mm/min, as written in the file
    f: Option<f64>,
    autostart: bool,
}

impl StreamState {
    fn new(autostart: bool) -> Self {
        Self {
            modifying: false,
            e_relative: false,
            g_relative: false,
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
            autostart,
        }
    }

    fn position(&self) -> Option<[f64; 4]> {
        Some([self.x?, self.y?, self.z?, self.e?])
    }

    fn is_known(&self) -> bool {
        self.position().is_some() && self.f.is_some()
    }

    fn apply_move(&self, command: &Command) -> Self {
        let mut next = *self;
        if let Some(x) = command.get('X') {
            next.x = Some(x);
        }
        if let Some(y) = command.get('Y') {
            next.y = Some(y);
        }
        if let Some(z) = command.get('Z') {
            next.z = Some(z);
        }
        if let Some(e) = command.get('E') {
            next.e = if self.e_relative { self.e.map(|current| current + e) } else { Some(e) };
        }
        if let Some(f) = command.get('F') {
            next.f = Some(f);
        }
        next
    }
}

pub struct GCodeProcessor<W: Write> {
    adjuster: MoveAdjuster,
    out: W,
    state: StreamState,
    line_count: usize,
}

impl<W: Write> GCodeProcessor<W> {
    pub fn new(adjuster: MoveAdjuster, out: W) -> Self {
        let autostart = adjuster.config().output.autostart;
        Self {
            adjuster,
            out,
            state: StreamState::new(autostart),
            line_count: 0,
        }
    }

    pub fn is_modifying(&self) -> bool {
        self.state.modifying
    }

    /// Process every line of `input`.
    pub fn process<R: BufRead>(&mut self, mut input: R) -> Result<(), GCodeError> {
        let mut buffer = String::new();
        while input.read_line(&mut buffer)? > 0 {
            self.process_line(&buffer)?;
            buffer.clear();
        }
        Ok(())
    }

    /// Process one line. A copied-through line keeps its own `\n` or `\r\n`
    /// terminator, or gets `\n` if it has none.
    pub fn process_line(&mut self, raw: &str) -> Result<(), GCodeError> {
        self.line_count += 1;
        let line = raw.trim_end_matches(['\n', '\r']);

        let command = match parse_line(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Line {}: {}, passing through", self.line_count, e);
                Command::default()
            }
        };

        let mut consumed = false;

        if command.has('G') {
            if !self.state.g_relative && (command.is('G', 0) || command.is('G', 1)) {
                consumed = self.handle_move(line, &command)?;
            }
            if command.is('G', 92) {
                self.set_position(&command);
            }
            if command.is('G', 91) {
                // relative moves are left alone and the position is lost
                self.state.g_relative = true;
                self.stop_modifying()?;
                self.state.x = None;
                self.state.y = None;
                self.state.z = None;
            }
            if command.is('G', 90) {
                self.state.g_relative = false;
            }
        }

        if command.is('M', 82) {
            self.state.e_relative = false;
        }
        if command.is('M', 83) {
            self.state.e_relative = true;
        }

        let output = &self.adjuster.config().output;
        let start = line.contains(output.start_marker.as_str());
        let end = line.contains(output.end_marker.as_str());
        if start {
            self.start_modifying()?;
        }
        if end {
            // smoothing does not resume until the next start marker
            self.state.autostart = false;
            self.stop_modifying()?;
        }

        if !consumed {
            if line.len() == raw.len() {
                writeln!(self.out, "{}", line)?;
            } else {
                self.out.write_all(raw.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Close any open smoothed section and return the writer.
    pub fn finish(mut self) -> Result<W, GCodeError> {
        self.stop_modifying()?;
        self.out.flush()?;
        tracing::info!("Processed {} lines", self.line_count);
        Ok(self.out)
    }

    fn handle_move(&mut self, line: &str, command: &Command) -> Result<bool, GCodeError> {
        let previous = self.state;
        let next = previous.apply_move(command);
        let mut consumed = false;

        if command.is('G', 1) && previous.modifying {
            match (previous.position(), next.position(), next.f) {
                (Some(source), Some(destination), Some(f)) => {
                    let e_relative = previous.e_relative;
                    if self.adjuster.adjust(source, destination, f / 60.0, e_relative, &mut self.out)? {
                        consumed = true;
                    } else if !command.has('F') {
                        // extruder-only move left to the firmware, which needs a speed
                        writeln!(self.out, "{} F{} ; note: added F to extruder-only move", line.trim_end(), f)?;
                        consumed = true;
                    }
                }
                _ => {
                    tracing::warn!(
                        "Line {}: position or feed rate unknown, passing move through",
                        self.line_count
                    );
                }
            }
        }

        self.state = next;

        if self.state.autostart && !self.state.modifying && self.state.is_known() {
            self.start_modifying()?;
        }

        if self.line_count % PROGRESS_INTERVAL == 0 {
            if let Some(z) = self.state.z {
                tracing::info!("z = {:.2} mm", z);
            }
        }
        Ok(consumed)
    }

    fn set_position(&mut self, command: &Command) {
        if let Some(x) = command.get('X') {
            self.state.x = Some(x);
        }
        if let Some(y) = command.get('Y') {
            self.state.y = Some(y);
        }
        if let Some(z) = command.get('Z') {
            self.state.z = Some(z);
        }
        if let Some(e) = command.get('E') {
            self.state.e = Some(e);
        }
    }

    fn start_modifying(&mut self) -> Result<(), GCodeError> {
        if self.state.modifying {
            return Ok(());
        }
        self.state.modifying = true;
        tracing::debug!("Smoothing enabled at line {}", self.line_count);
        for command in &self.adjuster.config().output.start_commands {
            writeln!(self.out, "{}", command)?;
        }
        Ok(())
    }

    fn stop_modifying(&mut self) -> Result<(), GCodeError> {
        if !self.state.modifying {
            return Ok(());
        }
        self.state.modifying = false;
        tracing::debug!("Smoothing disabled at line {}", self.line_count);
        for command in &self.adjuster.config().output.end_commands {
            writeln!(self.out, "{}", command)?;
        }
        Ok(())
    }
}
