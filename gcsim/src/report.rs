//! Console rendering of simulator results.

use std::io::{self, Write};

use heap::{CycleOutcome, GcError, Ledger, ScenarioReport, ShutdownReport, SweepReport};

const RULE: &str = "-------------------------------------";

pub fn error(out: &mut impl Write, err: &GcError) -> io::Result<()> {
    if err.is_warning() {
        writeln!(out, "Warning: {err}.")
    } else {
        writeln!(out, "Error: {err}.")
    }
}

fn counters(out: &mut impl Write, ledger: &Ledger) -> io::Result<()> {
    writeln!(out, "Total objects created: {}", ledger.objects_allocated())?;
    writeln!(out, "Total objects freed:   {}", ledger.objects_freed())?;
    writeln!(
        out,
        "Total memory allocated: {} bytes",
        ledger.bytes_allocated()
    )?;
    writeln!(out, "Total memory freed:     {} bytes", ledger.bytes_freed())?;
    writeln!(out, "Current memory in use:  {} bytes", ledger.live_bytes())
}

pub fn status(out: &mut impl Write, ledger: &Ledger) -> io::Result<()> {
    writeln!(out, "\n--- Memory Status ---")?;
    counters(out, ledger)
}

fn sweep(out: &mut impl Write, report: &SweepReport, live: usize) -> io::Result<()> {
    for name in report.names() {
        writeln!(out, "[GC] Collecting unreachable object: {name}")?;
    }
    writeln!(
        out,
        "[GC] Cycle complete -> {} object(s) collected.",
        report.objects_freed()
    )?;
    writeln!(
        out,
        "[GC] Memory freed this cycle: {} bytes",
        report.bytes_freed()
    )?;
    writeln!(out, "[GC] Current memory in use: {live} bytes\n")
}

pub fn cycle(out: &mut impl Write, outcome: &CycleOutcome) -> io::Result<()> {
    let report = match outcome {
        CycleOutcome::EmptyHeap => {
            return writeln!(out, "No objects in heap. Nothing to collect.");
        }
        CycleOutcome::Collected(report) => report,
    };

    writeln!(out, "\nRunning garbage collector...")?;
    writeln!(out, "Before GC: {} bytes in use", report.live_before)?;
    sweep(out, &report.sweep, report.live_after)?;
    writeln!(out, "After GC: {} bytes in use\n", report.live_after)
}

pub fn scenario(out: &mut impl Write, report: &ScenarioReport) -> io::Result<()> {
    let id = report.scenario.id();
    writeln!(out, "\n[Force Leak] Scenario {id} created ({} objects).", report.created)?;

    writeln!(out, "\n--- Unreachable Objects (Garbage) ---")?;
    if report.unreachable.is_empty() {
        writeln!(out, "No unreachable objects! All nodes are alive.")?;
    } else {
        for name in &report.unreachable {
            writeln!(out, " - {name}")?;
        }
        writeln!(
            out,
            "\nTotal unreachable = {} object(s)",
            report.unreachable.len()
        )?;
        writeln!(
            out,
            "Garbage memory (will be freed now) = {} bytes",
            report.garbage_bytes
        )?;
    }
    writeln!(out, "{RULE}")?;

    if let Some(swept) = &report.sweep {
        sweep(out, swept, report.ledger.live_bytes())?;
    }

    writeln!(out, "\n--- Memory Status After Scenario ---")?;
    counters(out, &report.ledger)?;
    writeln!(out, "{RULE}\n")?;
    writeln!(out, "[Force Leak] Scenario completed. Resetting simulator...")
}

pub fn shutdown(out: &mut impl Write, report: &ShutdownReport) -> io::Result<()> {
    if report.survivors.is_empty() {
        return writeln!(out, "\n[Cleanup] No remaining objects to free.");
    }

    writeln!(out, "\n[Cleanup] Freeing remaining objects...")?;
    for name in &report.survivors {
        writeln!(out, "Freeing survivor: {name}")?;
    }
    writeln!(
        out,
        "All memory freed successfully ({} bytes).",
        report.bytes_freed
    )
}
