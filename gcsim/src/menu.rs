//! The interactive numbered menu.

use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use chrono::Local;
use heap::{GcError, RootOutcome, Scenario, Simulator};
use log::{debug, error};

use crate::report;

/// Names longer than this are cut off, the rest of the line is dropped.
pub const MAX_NAME_LEN: usize = 99;

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Fatal(GcError),
}

/// Where the menu writes its files.
#[derive(Debug, Clone)]
pub struct Outputs {
    pub dot_path: PathBuf,
    pub snapshot_dir: PathBuf,
}

pub struct Menu<'a, R, W> {
    sim: &'a mut Simulator,
    input: R,
    out: W,
    outputs: Outputs,
    next_snapshot: u32,
}

enum Flow {
    Continue,
    Exit,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(sim: &'a mut Simulator, input: R, out: W, outputs: Outputs) -> Self {
        Self {
            sim,
            input,
            out,
            outputs,
            next_snapshot: 1,
        }
    }

    /// Runs until Exit is chosen or input ends. Both shut the simulator down.
    pub fn run(&mut self) -> Result<(), MenuError> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.read_choice()? else {
                debug!("input closed, exiting");
                return self.exit();
            };
            if let Flow::Exit = self.dispatch(choice)? {
                return Ok(());
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n===== MEMORY LEAK VISUAL DEMO =====")?;
        writeln!(self.out, "1. Create Object")?;
        writeln!(self.out, "2. Create Reference")?;
        writeln!(self.out, "3. Mark Object as Root")?;
        writeln!(self.out, "4. Run Garbage Collector")?;
        writeln!(self.out, "5. Visualize Heap (DOT)")?;
        writeln!(self.out, "6. Show Memory Status")?;
        writeln!(self.out, "7. Exit")?;
        writeln!(self.out, "8. Force Leak Scenario")?;
        writeln!(self.out, "9. Export Snapshot")
    }

    fn dispatch(&mut self, choice: u8) -> Result<Flow, MenuError> {
        match choice {
            1 => self.create_object()?,
            2 => self.create_reference()?,
            3 => self.mark_root()?,
            4 => {
                let outcome = self.sim.collect();
                report::cycle(&mut self.out, &outcome)?;
            }
            5 => self.visualize()?,
            6 => report::status(&mut self.out, &self.sim.status())?,
            7 => {
                self.exit()?;
                return Ok(Flow::Exit);
            }
            8 => self.force_scenario()?,
            9 => self.export_snapshot()?,
            _ => writeln!(self.out, "Invalid choice! Try again.")?,
        }
        Ok(Flow::Continue)
    }

    // ── Input ─────────────────────────────────────────────────────────

    /// Bytes that are not valid UTF-8 become U+FFFD instead of ending the session.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.out.flush()?;
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// `None` means input ended.
    fn read_choice(&mut self) -> io::Result<Option<u8>> {
        loop {
            write!(self.out, "Enter choice: ")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.trim().parse::<i64>() {
                Ok(n @ 1..=9) => return Ok(Some(n as u8)),
                Ok(_) => writeln!(
                    self.out,
                    "Invalid choice! Please enter a number between 1 and 9."
                )?,
                Err(_) => writeln!(
                    self.out,
                    "Invalid input. Please enter a numeric choice (1-9)."
                )?,
            }
        }
    }

    /// First word of the next non-blank line.
    fn read_name(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if let Some(word) = line.split_whitespace().next() {
                return Ok(Some(word.chars().take(MAX_NAME_LEN).collect()));
            }
        }
    }

    // ── Actions ───────────────────────────────────────────────────────

    /// Prints recoverable errors; fatal ones end the menu.
    fn report_error(&mut self, err: GcError) -> Result<(), MenuError> {
        if err.is_fatal() {
            return Err(MenuError::Fatal(err));
        }
        report::error(&mut self.out, &err)?;
        Ok(())
    }

    fn create_object(&mut self) -> Result<(), MenuError> {
        let Some(name) = self.read_name("Enter object name: ")? else {
            return Ok(());
        };
        match self.sim.create_object(&name) {
            Ok(id) => {
                let size = self.sim.store().get(id).map_or(0, |o| o.size());
                writeln!(self.out, "Created object '{name}' (approx {size} bytes)")?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn create_reference(&mut self) -> Result<(), MenuError> {
        let Some(from) = self.read_name("Enter source object name: ")? else {
            return Ok(());
        };
        let Some(to) = self.read_name("Enter target object name: ")? else {
            return Ok(());
        };
        match self.sim.add_reference(&from, &to) {
            Ok(()) => {
                writeln!(self.out, "Reference created: {from} -> {to}")?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn mark_root(&mut self) -> Result<(), MenuError> {
        let Some(name) = self.read_name("Enter object name to mark as root: ")? else {
            return Ok(());
        };
        match self.sim.mark_root(&name) {
            Ok(RootOutcome::Added) => {
                writeln!(self.out, "Object '{name}' marked as root.")?;
                Ok(())
            }
            Ok(RootOutcome::AlreadyRoot) => {
                writeln!(self.out, "Object '{name}' is already a root.")?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn visualize(&mut self) -> Result<(), MenuError> {
        writeln!(self.out, "Marking heap for visualization...")?;
        let dot = self.sim.visualize();
        let path = &self.outputs.dot_path;

        if let Err(err) = fs::write(path, dot) {
            error!("writing {}: {err}", path.display());
            writeln!(self.out, "Error: Could not create DOT file.")?;
            return Ok(());
        }
        writeln!(self.out, "DOT file generated: {}", path.display())?;
        writeln!(
            self.out,
            "To visualize: dot -Tpng {} -o {}\n",
            path.display(),
            path.with_extension("png").display()
        )?;
        Ok(())
    }

    fn force_scenario(&mut self) -> Result<(), MenuError> {
        writeln!(self.out, "\n--- Force Leak Scenarios ---")?;
        for scenario in Scenario::ALL {
            writeln!(self.out, "{scenario}")?;
        }
        write!(self.out, "Select scenario: ")?;

        let Some(line) = self.read_line()? else {
            return Ok(());
        };
        let Ok(id) = line.trim().parse::<u8>() else {
            writeln!(self.out, "Invalid scenario number.")?;
            return Ok(());
        };

        match self.sim.force_scenario(id) {
            Ok(report) => {
                report::scenario(&mut self.out, &report)?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn export_snapshot(&mut self) -> Result<(), MenuError> {
        // the counter advances even when the write fails
        let n = self.next_snapshot;
        self.next_snapshot += 1;
        let path = self.outputs.snapshot_dir.join(format!("snapshot_{n}.txt"));

        let text = self.sim.snapshot(&Local::now());
        if let Err(err) = fs::write(&path, text) {
            error!("writing {}: {err}", path.display());
            writeln!(self.out, "Error: Could not create snapshot file.")?;
            return Ok(());
        }
        writeln!(self.out, "Snapshot exported successfully: {}", path.display())?;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), MenuError> {
        let report = self.sim.shutdown();
        report::shutdown(&mut self.out, &report)?;
        writeln!(self.out, "\nProgram terminated successfully.")?;
        self.out.flush()?;
        Ok(())
    }
}
